use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Stage, StageReport};

/// Publishes batch lifecycle events to whoever drains the channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Sends an event, logging instead of failing when nobody is listening.
    /// Event delivery never decides the outcome of a stage.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping batch event");
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum Event {
    StageStarted {
        stage: Stage,
        run_id: Uuid,
    },
    StageCompleted(StageReport),
    StageFailed {
        stage: Stage,
        run_id: Uuid,
        message: String,
    },
}

impl Event {
    pub fn stage(&self) -> Stage {
        match self {
            Event::StageStarted { stage, .. } | Event::StageFailed { stage, .. } => *stage,
            Event::StageCompleted(report) => report.stage,
        }
    }
}

/// Creates a bounded event channel.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains events until every sender is dropped, logging each one.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::StageStarted { stage, run_id } => {
                info!(%stage, %run_id, "Stage started");
            }
            Event::StageCompleted(report) => {
                if report.is_clean() {
                    info!(stage = %report.stage, run_id = %report.run_id, "{}", report);
                } else {
                    warn!(
                        stage = %report.stage,
                        run_id = %report.run_id,
                        truncated = report.truncated_errors(),
                        "{}",
                        report
                    );
                    for message in &report.errors {
                        warn!(stage = %report.stage, "  {}", message);
                    }
                }
            }
            Event::StageFailed {
                stage,
                run_id,
                message,
            } => {
                error!(%stage, %run_id, "Stage failed: {}", message);
            }
        }
    }

    info!("Event processing loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn delivers_in_order() {
        let (sender, mut rx) = channel(4);
        let run_id = Uuid::new_v4();
        sender
            .send(Event::StageStarted {
                stage: Stage::Forecast,
                run_id,
            })
            .await
            .unwrap();
        sender
            .send(Event::StageCompleted(
                StageReport::start(Stage::Forecast, run_id, 10).finish(),
            ))
            .await
            .unwrap();

        assert_matches!(rx.recv().await, Some(Event::StageStarted { stage: Stage::Forecast, .. }));
        let completed = rx.recv().await.unwrap();
        assert_eq!(completed.stage(), Stage::Forecast);
    }

    #[tokio::test]
    async fn closed_channel_is_an_event_error() {
        let (sender, rx) = channel(1);
        drop(rx);
        let result = sender
            .send(Event::StageFailed {
                stage: Stage::Overstock,
                run_id: Uuid::new_v4(),
                message: "boom".into(),
            })
            .await;
        assert_matches!(result, Err(ServiceError::EventError(_)));

        // never panics or errors
        sender
            .send_or_log(Event::StageStarted {
                stage: Stage::Overstock,
                run_id: Uuid::new_v4(),
            })
            .await;
    }

    #[tokio::test]
    async fn processing_stops_when_senders_drop() {
        let (sender, rx) = channel(2);
        let handle = tokio::spawn(process_events(rx));
        sender
            .send_or_log(Event::StageStarted {
                stage: Stage::Seasonality,
                run_id: Uuid::new_v4(),
            })
            .await;
        drop(sender);
        handle.await.unwrap();
    }
}
