use anyhow::{Result, anyhow};

use crate::api::{init_tracing, push_service};
use crate::core::AppConfig;
use crate::notify::{NotificationKind, NotificationRequest, PushError};

/// Send a notification to every stored subscriber without going
/// through the HTTP server.
pub async fn run(
    title: String,
    body: String,
    url: Option<String>,
    icon: Option<String>,
    kind: Option<NotificationKind>,
) -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let service = push_service(&config).await?;

    let request = NotificationRequest {
        title,
        body,
        url,
        icon,
        kind,
    };
    let report = match service.send_notification(request).await {
        Ok(report) => report,
        Err(PushError::Validation(msg)) => return Err(anyhow!(msg)),
        Err(err) => return Err(err.into()),
    };

    println!(
        "Notification sent to {} subscribers ({} delivered, {} failed, {} removed)",
        report.attempted, report.delivered, report.failed, report.pruned
    );
    Ok(())
}
