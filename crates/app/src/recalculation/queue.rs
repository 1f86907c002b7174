//! In-process queue backed by a tokio channel.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::{QueueError, RecalculationJob, RecalculationQueue};

/// Sending half of the in-process queue.
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    sender: UnboundedSender<RecalculationJob>,
}

/// Create a queue and the receiver a worker drains.
#[must_use]
pub fn channel_queue() -> (ChannelQueue, UnboundedReceiver<RecalculationJob>) {
    let (sender, receiver) = unbounded_channel();

    (ChannelQueue { sender }, receiver)
}

impl RecalculationQueue for ChannelQueue {
    fn delay(&self, job: RecalculationJob) -> Result<(), QueueError> {
        self.sender.send(job).map_err(|_closed| QueueError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn jobs_arrive_in_order() -> TestResult {
        let (queue, mut receiver) = channel_queue();

        for product in ["P1", "P2"] {
            queue.delay(RecalculationJob {
                products: vec![product.to_string()],
                ..RecalculationJob::default()
            })?;
        }

        assert_eq!(receiver.recv().await.map(|job| job.products), Some(vec!["P1".to_string()]));
        assert_eq!(receiver.recv().await.map(|job| job.products), Some(vec!["P2".to_string()]));

        Ok(())
    }

    #[test]
    fn delay_fails_once_receiver_is_gone() {
        let (queue, receiver) = channel_queue();

        drop(receiver);

        assert_eq!(queue.delay(RecalculationJob::default()), Err(QueueError::Closed));
    }
}
