// Column types are shared by every backend: ids and timestamps are BIGINT,
// enumerations are stored as TEXT.

diesel::table! {
    organizations (id) {
        id -> BigInt,
        slug -> Text,
        name -> Text,
    }
}

diesel::table! {
    users (id) {
        id -> BigInt,
        username -> Text,
        name -> Text,
        email -> Text,
        is_active -> Bool,
        is_superuser -> Bool,
    }
}

diesel::table! {
    organization_members (id) {
        id -> BigInt,
        organization_id -> BigInt,
        user_id -> BigInt,
        role -> Text,
    }
}

diesel::table! {
    integrations (id) {
        id -> BigInt,
        provider -> Text,
        external_id -> Text,
        name -> Text,
        access_token -> Text,
        bot_access_token -> Nullable<Text>,
    }
}

diesel::table! {
    organization_integrations (id) {
        id -> BigInt,
        organization_id -> BigInt,
        integration_id -> BigInt,
    }
}

diesel::table! {
    identity_providers (id) {
        id -> BigInt,
        provider_type -> Text,
        organization_id -> BigInt,
    }
}

diesel::table! {
    identities (id) {
        id -> BigInt,
        idp_id -> BigInt,
        user_id -> Nullable<BigInt>,
        external_id -> Text,
        status -> Text,
    }
}

diesel::table! {
    auth_providers (id) {
        id -> BigInt,
        organization_id -> BigInt,
        provider -> Text,
    }
}

diesel::table! {
    auth_identities (id) {
        id -> BigInt,
        auth_provider_id -> BigInt,
        user_id -> BigInt,
        ident -> Text,
    }
}

diesel::table! {
    projects (id) {
        id -> BigInt,
        organization_id -> BigInt,
        slug -> Text,
        name -> Text,
    }
}

diesel::table! {
    issues (id) {
        id -> BigInt,
        project_id -> BigInt,
        short_id -> BigInt,
        title -> Text,
        culprit -> Text,
        status -> Text,
        resolution -> Nullable<Text>,
        assignee_id -> Nullable<BigInt>,
        last_seen -> BigInt,
    }
}
