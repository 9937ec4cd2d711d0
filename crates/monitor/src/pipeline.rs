//! 파이프라인 오케스트레이션 -- 테일링/디코딩/분류/알림의 전체 흐름을 관리합니다.
//!
//! [`MonitorPipeline`]은 core의 [`Pipeline`](connwatch_core::pipeline::Pipeline)
//! trait을 구현하여 `connwatch-daemon`에서 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! TailReader -> RecordDecoder -> FeatureProjector -> Classifier
//!            -> LabelPolicy -> AlertThrottler -> mpsc -> downstream
//! ```
//!
//! 백그라운드 워커 태스크가 폴링 주기마다 conn.log를 읽고, 줄 단위로
//! 디코딩/분류한 뒤 방출 정책을 통과한 알림을 채널로 전달합니다.
//! 모든 레코드 단위 에러는 해당 레코드만 건너뛰며 루프를 중단하지 않습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use connwatch_core::error::ConnwatchError;
use connwatch_core::event::{AlertEvent, MODULE_MONITOR};
use connwatch_core::metrics::{
    LABEL_PROTOCOL, LABEL_VERDICT, MONITOR_ALERTS_EMITTED_TOTAL, MONITOR_CLASSIFY_ERRORS_TOTAL,
    MONITOR_DECODE_ERRORS_TOTAL, MONITOR_LINES_READ_TOTAL, MONITOR_POLL_DURATION_SECONDS,
    MONITOR_POLL_ERRORS_TOTAL, MONITOR_RECORDS_DECODED_TOTAL, MONITOR_ROTATIONS_TOTAL,
    MONITOR_STATUS_EMITTED_TOTAL, MONITOR_STATUS_SUPPRESSED_TOTAL, MONITOR_TAIL_OFFSET_BYTES,
};
use connwatch_core::pipeline::{Classifier, HealthStatus, Pipeline};
use connwatch_core::types::{LabelPolicy, Verdict};

use crate::config::MonitorConfig;
use crate::decode::{Decoded, RecordDecoder};
use crate::error::MonitorError;
use crate::feature::FeatureProjector;
use crate::model::{ModelLoader, RuleModelClassifier};
use crate::tail::{TailOutcome, TailReader};
use crate::throttle::AlertThrottler;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 워커 루프 통계 (워커 태스크와 파이프라인 핸들이 공유)
#[derive(Debug, Default)]
pub struct MonitorStats {
    /// 읽어들인 전체 줄 수
    pub lines_read: AtomicU64,
    /// 디코딩된 레코드 수
    pub records_decoded: AtomicU64,
    /// 디코딩 에러 수
    pub decode_errors: AtomicU64,
    /// 분류 에러 수
    pub classify_errors: AtomicU64,
    /// 폴링 I/O 에러 수
    pub poll_errors: AtomicU64,
    /// 감지된 로테이션 수
    pub rotations: AtomicU64,
    /// 방출된 악성 알림 수
    pub alerts_emitted: AtomicU64,
    /// 방출된 정상 상태 보고 수
    pub status_emitted: AtomicU64,
    /// 억제된 상태 보고 수
    pub status_suppressed: AtomicU64,
}

impl MonitorStats {
    /// 현재 카운터 값의 스냅샷을 반환합니다.
    pub fn snapshot(&self) -> MonitorStatsSnapshot {
        MonitorStatsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            records_decoded: self.records_decoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            classify_errors: self.classify_errors.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            alerts_emitted: self.alerts_emitted.load(Ordering::Relaxed),
            status_emitted: self.status_emitted.load(Ordering::Relaxed),
            status_suppressed: self.status_suppressed.load(Ordering::Relaxed),
        }
    }
}

/// [`MonitorStats`]의 시점 스냅샷
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MonitorStatsSnapshot {
    pub lines_read: u64,
    pub records_decoded: u64,
    pub decode_errors: u64,
    pub classify_errors: u64,
    pub poll_errors: u64,
    pub rotations: u64,
    pub alerts_emitted: u64,
    pub status_emitted: u64,
    pub status_suppressed: u64,
}

/// 모니터 파이프라인 -- conn.log 감시의 전체 흐름을 관리합니다.
///
/// core의 `Pipeline` trait을 구현하여 `connwatch-daemon`에서
/// start/stop/health_check 생명주기로 관리됩니다.
///
/// # 사용 예시
/// ```ignore
/// use connwatch_monitor::{MonitorPipeline, MonitorPipelineBuilder};
///
/// let (mut pipeline, alert_rx) = MonitorPipelineBuilder::new()
///     .config(config)
///     .build()?;
///
/// pipeline.start().await?;
/// ```
pub struct MonitorPipeline {
    /// 파이프라인 설정
    config: MonitorConfig,
    /// 현재 상태
    state: PipelineState,
    /// 분류기 (start 시 모델 파일에서 로드, 또는 빌더로 주입)
    classifier: Option<Arc<dyn Classifier>>,
    /// 알림 전송 채널 (파이프라인 -> downstream)
    alert_tx: mpsc::Sender<AlertEvent>,
    /// 워커 취소 토큰
    cancel: CancellationToken,
    /// 백그라운드 워커 핸들
    worker: Option<JoinHandle<()>>,
    /// 워커 루프 통계
    stats: Arc<MonitorStats>,
}

impl MonitorPipeline {
    /// 현재 상태 이름을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 워커 통계 스냅샷을 반환합니다.
    pub fn stats(&self) -> MonitorStatsSnapshot {
        self.stats.snapshot()
    }

    /// 파이프라인 설정을 반환합니다.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl Pipeline for MonitorPipeline {
    async fn start(&mut self) -> Result<(), ConnwatchError> {
        if self.state == PipelineState::Running {
            return Err(connwatch_core::error::PipelineError::AlreadyRunning.into());
        }

        tracing::info!(path = %self.config.conn_log_path, "starting monitor pipeline");

        // 모델 로드 실패는 치명적 에러로 기동을 중단시킵니다.
        let classifier = match &self.classifier {
            Some(classifier) => Arc::clone(classifier),
            None => {
                let artifact = ModelLoader::load_file(&self.config.model_path).await?;
                let classifier: Arc<dyn Classifier> =
                    Arc::new(RuleModelClassifier::new(artifact)?);
                self.classifier = Some(Arc::clone(&classifier));
                classifier
            }
        };

        // 정지 후 재시작을 위해 매번 새 토큰을 만듭니다.
        self.cancel = CancellationToken::new();

        let worker = MonitorWorker::new(
            self.config.clone(),
            classifier,
            self.alert_tx.clone(),
            self.cancel.clone(),
            Arc::clone(&self.stats),
        );
        self.worker = Some(tokio::spawn(worker.run()));

        self.state = PipelineState::Running;
        tracing::info!("monitor pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ConnwatchError> {
        if self.state != PipelineState::Running {
            return Err(connwatch_core::error::PipelineError::NotRunning.into());
        }

        tracing::info!("stopping monitor pipeline");

        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "monitor worker join failed");
            }
        }

        self.state = PipelineState::Stopped;
        tracing::info!("monitor pipeline stopped");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, ConnwatchError> {
        let status = match self.state {
            PipelineState::Initialized => HealthStatus::Degraded("not started".to_owned()),
            PipelineState::Running => match &self.worker {
                Some(worker) if worker.is_finished() => {
                    HealthStatus::Unhealthy("monitor task exited".to_owned())
                }
                Some(_) => HealthStatus::Healthy,
                None => HealthStatus::Unhealthy("monitor task missing".to_owned()),
            },
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        };
        Ok(status)
    }

    fn name(&self) -> &str {
        MODULE_MONITOR
    }
}

/// 백그라운드 워커 -- 폴링 루프의 실체입니다.
///
/// 파이프라인 핸들과 상태를 공유하지 않고 자체 상태(테일 커서, 디코더,
/// 스로틀러)를 소유합니다.
struct MonitorWorker {
    config: MonitorConfig,
    classifier: Arc<dyn Classifier>,
    alert_tx: mpsc::Sender<AlertEvent>,
    cancel: CancellationToken,
    stats: Arc<MonitorStats>,
    tail: TailReader,
    decoder: RecordDecoder,
    throttler: AlertThrottler,
    policy: LabelPolicy,
}

impl MonitorWorker {
    fn new(
        config: MonitorConfig,
        classifier: Arc<dyn Classifier>,
        alert_tx: mpsc::Sender<AlertEvent>,
        cancel: CancellationToken,
        stats: Arc<MonitorStats>,
    ) -> Self {
        let tail = TailReader::new(
            &config.conn_log_path,
            config.max_line_length,
            config.max_lines_per_poll,
        );
        let throttler = AlertThrottler::new(config.benign_interval());
        let policy = config.label_policy.clone();

        Self {
            config,
            classifier,
            alert_tx,
            cancel,
            stats,
            tail,
            decoder: RecordDecoder::new(),
            throttler,
            policy,
        }
    }

    /// 폴링 루프. 취소되거나 알림 채널이 닫힐 때까지 실행됩니다.
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("monitor loop cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            if !self.poll_once().await {
                break;
            }
        }
    }

    /// 폴링 1회를 수행합니다. `false`를 반환하면 루프를 종료합니다.
    async fn poll_once(&mut self) -> bool {
        let started = std::time::Instant::now();

        let outcome = match self.tail.poll().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "conn.log poll failed");
                self.stats.poll_errors.fetch_add(1, Ordering::Relaxed);
                counter!(MONITOR_POLL_ERRORS_TOTAL).increment(1);
                return self.backoff(self.config.error_backoff()).await;
            }
        };

        let lines = match outcome {
            TailOutcome::Missing => {
                tracing::warn!(path = %self.config.conn_log_path, "conn.log not found, waiting");
                return self.backoff(self.config.missing_backoff()).await;
            }
            TailOutcome::Rotated(lines) => {
                tracing::info!(path = %self.config.conn_log_path, "rotation detected, cursor reset");
                self.stats.rotations.fetch_add(1, Ordering::Relaxed);
                counter!(MONITOR_ROTATIONS_TOTAL).increment(1);
                lines
            }
            TailOutcome::Lines(lines) => lines,
        };

        if !lines.is_empty() && !self.process_lines(&lines).await {
            return false;
        }

        histogram!(MONITOR_POLL_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        gauge!(MONITOR_TAIL_OFFSET_BYTES).set(self.tail.offset() as f64);
        true
    }

    /// 폴링 1회분의 줄들을 처리합니다. 알림 채널이 닫히면 `false`를 반환합니다.
    async fn process_lines(&mut self, lines: &[bytes::Bytes]) -> bool {
        // 같은 폴링에서 나온 알림은 trace_id를 공유합니다.
        let batch_trace = Uuid::new_v4().to_string();

        for line in lines {
            self.stats.lines_read.fetch_add(1, Ordering::Relaxed);
            counter!(MONITOR_LINES_READ_TOTAL).increment(1);

            let record = match self.decoder.decode(line) {
                Ok(Decoded::Record(record)) => record,
                Ok(Decoded::Skipped) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to decode conn.log line");
                    self.stats.decode_errors.fetch_add(1, Ordering::Relaxed);
                    counter!(MONITOR_DECODE_ERRORS_TOTAL).increment(1);
                    continue;
                }
            };
            self.stats.records_decoded.fetch_add(1, Ordering::Relaxed);
            counter!(MONITOR_RECORDS_DECODED_TOTAL, LABEL_PROTOCOL => record.proto.clone())
                .increment(1);

            let features = FeatureProjector::project(&record);
            let label = match self.classifier.classify(&features) {
                Ok(label) => label,
                Err(e) => {
                    tracing::warn!(uid = %record.uid, error = %e, "classification failed, skipping record");
                    self.stats.classify_errors.fetch_add(1, Ordering::Relaxed);
                    counter!(MONITOR_CLASSIFY_ERRORS_TOTAL).increment(1);
                    continue;
                }
            };
            let verdict = self.policy.verdict(&label);

            let Some(event) = self
                .throttler
                .decide(&record, label, verdict, Some(&batch_trace))
            else {
                self.stats.status_suppressed.fetch_add(1, Ordering::Relaxed);
                counter!(MONITOR_STATUS_SUPPRESSED_TOTAL).increment(1);
                continue;
            };

            match verdict {
                Verdict::Malicious => {
                    self.stats.alerts_emitted.fetch_add(1, Ordering::Relaxed);
                    counter!(MONITOR_ALERTS_EMITTED_TOTAL).increment(1);
                }
                Verdict::Benign | Verdict::Other => {
                    self.stats.status_emitted.fetch_add(1, Ordering::Relaxed);
                    counter!(MONITOR_STATUS_EMITTED_TOTAL, LABEL_VERDICT => verdict.as_str())
                        .increment(1);
                }
            }

            if self.alert_tx.send(event).await.is_err() {
                tracing::warn!("alert channel closed, stopping monitor loop");
                return false;
            }
        }
        true
    }

    /// 취소 가능한 대기. 취소되면 `false`를 반환합니다.
    async fn backoff(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

/// 모니터 파이프라인 빌더
///
/// 파이프라인을 구성하고 알림 채널을 생성합니다.
pub struct MonitorPipelineBuilder {
    config: MonitorConfig,
    classifier: Option<Arc<dyn Classifier>>,
    alert_tx: Option<mpsc::Sender<AlertEvent>>,
}

impl MonitorPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
            classifier: None,
            alert_tx: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// 분류기를 직접 주입합니다.
    ///
    /// 설정하지 않으면 start 시 `model_path`의 YAML 아티팩트를 로드합니다.
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// 외부 알림 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 `alert_channel_capacity`로 새 채널을 생성합니다.
    pub fn alert_sender(mut self, tx: mpsc::Sender<AlertEvent>) -> Self {
        self.alert_tx = Some(tx);
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Returns
    /// - `MonitorPipeline`: 파이프라인 인스턴스
    /// - `Option<mpsc::Receiver<AlertEvent>>`: 알림 수신 채널
    ///   (외부 alert_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(MonitorPipeline, Option<mpsc::Receiver<AlertEvent>>), MonitorError> {
        self.config.validate()?;

        let (alert_tx, alert_rx) = if let Some(tx) = self.alert_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.config.alert_channel_capacity);
            (tx, Some(rx))
        };

        let pipeline = MonitorPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            classifier: self.classifier,
            alert_tx,
            cancel: CancellationToken::new(),
            worker: None,
            stats: Arc::new(MonitorStats::default()),
        };

        Ok((pipeline, alert_rx))
    }
}

impl Default for MonitorPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use tokio::time::timeout;

    use connwatch_core::error::{ModelError, PipelineError};
    use connwatch_core::types::{FeatureVector, Label, Severity};

    use crate::config::MonitorConfigBuilder;

    struct FixedLabel(&'static str);

    impl Classifier for FixedLabel {
        fn classify(&self, _features: &FeatureVector) -> Result<Label, ConnwatchError> {
            Ok(Label::from(self.0))
        }
    }

    fn test_config(dir: &Path) -> MonitorConfig {
        MonitorConfigBuilder::new()
            .conn_log_path(dir.join("conn.log").display().to_string())
            .model_path(dir.join("model.yaml").display().to_string())
            .poll_interval_ms(10)
            .missing_backoff_secs(1)
            .error_backoff_secs(1)
            .benign_interval_secs(0)
            .build()
            .unwrap()
    }

    fn conn_line() -> String {
        [
            "1695452520.123456",
            "CABC123def456",
            "192.168.1.100",
            "51234",
            "10.0.0.1",
            "443",
            "tcp",
            "ssl",
            "1.25",
            "1024",
            "4096",
            "S0",
            "T",
            "F",
            "0",
            "S",
            "3",
            "180",
            "0",
            "0",
            "-",
            "6",
        ]
        .join("\t")
    }

    #[test]
    fn builder_creates_pipeline() {
        let (pipeline, alert_rx) = MonitorPipelineBuilder::new().build().unwrap();
        assert_eq!(pipeline.state_name(), "initialized");
        assert_eq!(pipeline.name(), "monitor");
        assert!(alert_rx.is_some());
    }

    #[test]
    fn builder_with_external_alert_sender() {
        let (alert_tx, _alert_rx) = mpsc::channel(10);
        let (_pipeline, rx) = MonitorPipelineBuilder::new()
            .alert_sender(alert_tx)
            .build()
            .unwrap();
        assert!(rx.is_none());
    }

    #[test]
    fn builder_with_invalid_config_fails() {
        let mut config = MonitorConfig::default();
        config.conn_log_path = String::new();
        let result = MonitorPipelineBuilder::new().config(config).build();
        assert!(result.is_err());
    }

    #[test]
    fn stats_start_at_zero() {
        let (pipeline, _rx) = MonitorPipelineBuilder::new().build().unwrap();
        let stats = pipeline.stats();
        assert_eq!(stats.lines_read, 0);
        assert_eq!(stats.alerts_emitted, 0);
    }

    #[tokio::test]
    async fn stop_before_start_fails() {
        let (mut pipeline, _rx) = MonitorPipelineBuilder::new().build().unwrap();
        let err = pipeline.stop().await.unwrap_err();
        assert!(matches!(
            err,
            ConnwatchError::Pipeline(PipelineError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn health_is_degraded_before_start() {
        let (pipeline, _rx) = MonitorPipelineBuilder::new().build().unwrap();
        let status = pipeline.health_check().await.unwrap();
        assert!(status.is_degraded());
    }

    #[tokio::test]
    async fn start_without_model_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _rx) = MonitorPipelineBuilder::new()
            .config(test_config(dir.path()))
            .build()
            .unwrap();

        let err = pipeline.start().await.unwrap_err();
        assert!(matches!(
            err,
            ConnwatchError::Model(ModelError::Load { .. })
        ));
        // 기동 실패 시 상태는 변하지 않습니다
        assert_eq!(pipeline.state_name(), "initialized");
    }

    #[tokio::test]
    async fn lifecycle_with_injected_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _rx) = MonitorPipelineBuilder::new()
            .config(test_config(dir.path()))
            .classifier(Arc::new(FixedLabel("Benign")))
            .build()
            .unwrap();

        pipeline.start().await.unwrap();
        assert_eq!(pipeline.state_name(), "running");
        assert!(pipeline.health_check().await.unwrap().is_healthy());

        // 이중 시작은 거부
        let err = pipeline.start().await.unwrap_err();
        assert!(matches!(
            err,
            ConnwatchError::Pipeline(PipelineError::AlreadyRunning)
        ));

        pipeline.stop().await.unwrap();
        assert_eq!(pipeline.state_name(), "stopped");
        assert!(pipeline.health_check().await.unwrap().is_unhealthy());

        // 정지 후 재시작 가능
        pipeline.start().await.unwrap();
        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn malicious_line_produces_alert() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("conn.log");
        std::fs::write(&log_path, format!("{}\n", conn_line())).unwrap();

        let (mut pipeline, rx) = MonitorPipelineBuilder::new()
            .config(test_config(dir.path()))
            .classifier(Arc::new(FixedLabel("Malicious-C2")))
            .build()
            .unwrap();
        let mut rx = rx.unwrap();

        pipeline.start().await.unwrap();

        let event = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.alert.label.as_str(), "Malicious-C2");
        assert_eq!(event.alert.verdict, Verdict::Malicious);
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.alert.orig_h, "192.168.1.100");

        let stats = pipeline.stats();
        assert!(stats.lines_read >= 1);
        assert!(stats.records_decoded >= 1);
        assert_eq!(stats.alerts_emitted, 1);

        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn comment_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("conn.log");
        std::fs::write(
            &log_path,
            format!("#fields ts uid\n{}\n#close 2026-08-25\n", conn_line()),
        )
        .unwrap();

        let (mut pipeline, rx) = MonitorPipelineBuilder::new()
            .config(test_config(dir.path()))
            .classifier(Arc::new(FixedLabel("Malicious-Scan")))
            .build()
            .unwrap();
        let mut rx = rx.unwrap();

        pipeline.start().await.unwrap();

        let event = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.alert.verdict, Verdict::Malicious);

        // 주석 2줄은 알림 없이 소비됨
        let stats = pipeline.stats();
        assert_eq!(stats.records_decoded, 1);
        assert_eq!(stats.decode_errors, 0);

        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn closed_alert_channel_stops_worker() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("conn.log");
        std::fs::write(&log_path, format!("{}\n", conn_line())).unwrap();

        let (mut pipeline, rx) = MonitorPipelineBuilder::new()
            .config(test_config(dir.path()))
            .classifier(Arc::new(FixedLabel("Malicious-C2")))
            .build()
            .unwrap();
        drop(rx);

        pipeline.start().await.unwrap();

        // 수신자가 없으므로 워커는 첫 알림 전송에서 종료됩니다
        tokio::time::sleep(Duration::from_millis(500)).await;
        let status = pipeline.health_check().await.unwrap();
        assert!(status.is_unhealthy());

        pipeline.stop().await.unwrap();
    }
}
