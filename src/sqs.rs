use crate::{client::Scope, error::RuntimeError, ssm::SsmClient};
use aws_sdk_sqs::{
    model::{Message, QueueAttributeName},
    Client, Error,
};

/// Hard ceiling SQS puts on a single receive call.
const MAX_RECEIVE_BATCH: usize = 10;

/// SQS client implementation.
///
/// When the scope names a team, pipeline and stage, the stage queue and
/// DLQ names are resolved from SSM at construction time.
pub struct SqsClient {
    inner: Client,
    stage_queue: Option<String>,
    stage_dlq: Option<String>,
}

impl SqsClient {
    /// Initialize the SQS client, resolving the stage queue pair when the
    /// scope allows it.
    #[tracing::instrument(skip(config, ssm))]
    pub async fn new(
        config: &aws_types::SdkConfig,
        ssm: &SsmClient,
        scope: &Scope,
    ) -> Result<SqsClient, RuntimeError> {
        let (stage_queue, stage_dlq) = match (&scope.team, &scope.pipeline, &scope.stage) {
            (Some(team), Some(pipeline), Some(stage)) => (
                Some(
                    ssm.get_parameter(&format!("/SDLF/SQS/{}/{}{}Queue", team, pipeline, stage))
                        .await?,
                ),
                Some(
                    ssm.get_parameter(&format!("/SDLF/SQS/{}/{}{}DLQ", team, pipeline, stage))
                        .await?,
                ),
            ),
            _ => (None, None),
        };

        Ok(SqsClient {
            inner: Client::new(config),
            stage_queue,
            stage_dlq,
        })
    }

    /// URL of the stage queue.
    #[tracing::instrument(skip(self))]
    pub async fn stage_queue_url(&self) -> Result<String, RuntimeError> {
        let name = self
            .stage_queue
            .as_deref()
            .ok_or(RuntimeError::MissingScope("stage queue"))?;
        self.queue_url(name).await
    }

    /// URL of the stage dead-letter queue.
    #[tracing::instrument(skip(self))]
    pub async fn stage_dlq_url(&self) -> Result<String, RuntimeError> {
        let name = self
            .stage_dlq
            .as_deref()
            .ok_or(RuntimeError::MissingScope("stage dlq"))?;
        self.queue_url(name).await
    }

    async fn queue_url(&self, name: &str) -> Result<String, RuntimeError> {
        self.inner
            .get_queue_url()
            .queue_name(name)
            .send()
            .await
            .map_err(Error::from)?
            .queue_url
            .ok_or_else(|| RuntimeError::MissingField("QueueUrl".into()))
    }

    /// Receive up to `max_num_messages` messages, deleting each one from
    /// the queue as soon as it is received. The hand-off to the caller is
    /// at most once: a crash after this call loses the messages.
    #[tracing::instrument(skip(self))]
    pub async fn receive_messages(
        &self,
        max_num_messages: i32,
        queue_url: &str,
    ) -> Result<Vec<Message>, RuntimeError> {
        let messages = self
            .inner
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_num_messages)
            .wait_time_seconds(1)
            .send()
            .await
            .map_err(Error::from)?
            .messages
            .unwrap_or_default();

        for message in &messages {
            let receipt_handle = message
                .receipt_handle()
                .ok_or_else(|| RuntimeError::MissingField("ReceiptHandle".into()))?;
            self.inner
                .delete_message()
                .queue_url(queue_url)
                .receipt_handle(receipt_handle)
                .send()
                .await
                .map_err(Error::from)?;
        }

        Ok(messages)
    }

    /// Drain between `min_items_process` and `max_items_process` message
    /// bodies from the queue.
    ///
    /// Returns nothing at all when the queue holds fewer than
    /// `min_items_process` messages. A message arriving without a body
    /// means the queue drained early; the remaining chunks are skipped.
    #[tracing::instrument(skip(self))]
    pub async fn receive_min_max_messages(
        &self,
        min_items_process: usize,
        max_items_process: usize,
        queue_url: &str,
    ) -> Result<Vec<String>, RuntimeError> {
        let num_messages_queue = self.approximate_message_count(queue_url).await?;

        if num_messages_queue == 0 || min_items_process > num_messages_queue {
            tracing::info!("not enough messages to process, exiting");
            return Ok(Vec::new());
        }

        let mut bodies = Vec::new();
        'chunks: for batch_size in batch_sizes(num_messages_queue, max_items_process) {
            let messages = self.receive_messages(batch_size as i32, queue_url).await?;
            for message in messages {
                match message.body {
                    Some(body) => bodies.push(body),
                    None => break 'chunks,
                }
            }
        }

        Ok(bodies)
    }

    /// Send a message to a FIFO queue with a fresh deduplication id, so
    /// identical bodies sent twice never collide.
    #[tracing::instrument(skip(self, message))]
    pub async fn send_message_to_fifo_queue(
        &self,
        message: &str,
        group_id: &str,
        queue_url: &str,
    ) -> Result<(), RuntimeError> {
        self.inner
            .send_message()
            .queue_url(queue_url)
            .message_body(message)
            .message_group_id(group_id)
            .message_deduplication_id(uuid::Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(Error::from)?;

        Ok(())
    }

    async fn approximate_message_count(&self, queue_url: &str) -> Result<usize, RuntimeError> {
        let attributes = self
            .inner
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(Error::from)?
            .attributes
            .unwrap_or_default();

        let count = attributes
            .get(&QueueAttributeName::ApproximateNumberOfMessages)
            .ok_or_else(|| RuntimeError::MissingField("ApproximateNumberOfMessages".into()))?;

        Ok(count.parse()?)
    }
}

/// Partition a drain of `num_messages_queue` messages, clamped to
/// `max_items_process`, into receive-call sized chunks.
fn batch_sizes(num_messages_queue: usize, max_items_process: usize) -> Vec<usize> {
    let target = num_messages_queue.min(max_items_process);
    let mut sizes = vec![MAX_RECEIVE_BATCH; target / MAX_RECEIVE_BATCH];
    if target % MAX_RECEIVE_BATCH > 0 {
        sizes.push(target % MAX_RECEIVE_BATCH);
    }
    sizes
}
