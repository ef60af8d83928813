//! Parallel latency sampling
//!
//! Fans `sample_count` recognition calls out over a pool of `num_parallel`
//! workers. Images are assigned round-robin, each call is timed from just
//! before the request is sent until the parsed response is available, and
//! samples are collected in completion order.

use crate::{
    client::RecognitionClient,
    error::{AppError, ErrorContext, Result},
    logging::SamplerLogger,
    models::{Config, Sample, SampleImage},
    types::FailurePolicy,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// Outcome of a sampling run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingRun {
    /// Successful samples in completion order
    pub samples: Vec<Sample>,
    /// Calls that failed and were skipped
    pub failures: usize,
    /// Wall-clock duration of the whole run
    pub wall_time: Duration,
}

impl SamplingRun {
    pub fn attempted(&self) -> usize {
        self.samples.len() + self.failures
    }

    /// Completed calls per second of wall time
    pub fn throughput(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs > 0.0 {
            self.samples.len() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Bounded worker pool issuing recognition calls
pub struct Sampler {
    client: Arc<dyn RecognitionClient>,
    sample_count: u32,
    num_parallel: usize,
    failure_policy: FailurePolicy,
    logger: Option<Arc<SamplerLogger>>,
}

impl Sampler {
    pub fn new(client: Arc<dyn RecognitionClient>, config: &Config) -> Self {
        Self {
            client,
            sample_count: config.sample_count,
            num_parallel: config.num_parallel,
            failure_policy: config.failure_policy,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: SamplerLogger) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Run every call and collect the samples
    ///
    /// Under `FailFast` the first failed call cancels the outstanding ones
    /// and its error is returned. Under `KeepGoing` the run only fails when
    /// no call succeeded, with the category of the last failure.
    pub async fn run(&self, images: &[SampleImage]) -> Result<SamplingRun> {
        if images.is_empty() {
            return Err(AppError::validation("At least one image is required for sampling"));
        }
        if self.num_parallel == 0 {
            return Err(AppError::validation("Parallelism must be at least 1"));
        }

        if let Some(logger) = &self.logger {
            logger.log_start(self.sample_count, self.num_parallel, images.len()).await;
        }

        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.num_parallel));
        let (result_sender, mut result_receiver) =
            mpsc::channel::<(usize, Result<Sample>)>((self.sample_count as usize).clamp(1, 1024));

        let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(self.sample_count as usize);
        for sequence in 0..self.sample_count as usize {
            let image_index = sequence % images.len();
            let image = images[image_index].clone();
            let client = self.client.clone();
            let semaphore = semaphore.clone();
            let sender = result_sender.clone();

            tasks.push(tokio::spawn(async move {
                // A closed semaphore means the run was aborted
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                let result = Self::take_sample(client.as_ref(), &image, image_index).await;
                let _ = sender.send((sequence, result)).await;
            }));
        }

        // Receiver ends once every task has dropped its sender
        drop(result_sender);

        let mut run = SamplingRun::default();
        let mut last_error = None;
        while let Some((sequence, result)) = result_receiver.recv().await {
            match result {
                Ok(sample) => {
                    if let Some(logger) = &self.logger {
                        logger.log_sample(sequence, &sample).await;
                    }
                    run.samples.push(sample);
                }
                Err(e) => {
                    if let Some(logger) = &self.logger {
                        logger.log_failure(sequence, &e).await;
                    }
                    match self.failure_policy {
                        FailurePolicy::FailFast => {
                            semaphore.close();
                            for task in &tasks {
                                task.abort();
                            }
                            return Err(e);
                        }
                        FailurePolicy::KeepGoing => {
                            run.failures += 1;
                            last_error = Some(e);
                        }
                    }
                }
            }
        }

        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                if e.is_panic() {
                    return Err(AppError::internal(format!("Sampling task panicked: {}", e)));
                }
            }
        }

        run.wall_time = started.elapsed();

        if let Some(logger) = &self.logger {
            logger.log_complete(run.samples.len(), run.failures, run.wall_time).await;
        }

        if run.samples.is_empty() {
            if let Some(e) = last_error {
                let attempted = run.attempted();
                return Err(e).with_context(|| format!("All {} recognition calls failed", attempted));
            }
        }

        Ok(run)
    }

    /// Time one recognition call
    ///
    /// The body is copied before the clock starts so only the request is measured.
    async fn take_sample(
        client: &dyn RecognitionClient,
        image: &SampleImage,
        image_index: usize,
    ) -> Result<Sample> {
        let body = image.data.as_ref().clone();
        let payload_bytes = body.len();

        let start = Instant::now();
        client.recognize(body).await?;
        let latency = start.elapsed();

        Ok(Sample::new(latency, payload_bytes, image_index))
    }
}
