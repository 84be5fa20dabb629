use salvo::prelude::*;
use serde_json::json;

use crate::web::metrics::Metrics;

#[handler]
pub async fn health_check(res: &mut Response) {
    res.render("OK");
}

#[handler]
pub async fn get_status(res: &mut Response) {
    let status = json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": Metrics::uptime_seconds(),
    });

    res.render(Json(status));
}
