//! 알림 스로틀러 -- 판정 결과를 AlertEvent로 변환합니다.
//!
//! [`AlertThrottler`]는 분류 판정을 받아 방출 정책을 적용한 뒤
//! [`AlertEvent`](connwatch_core::event::AlertEvent)를 생성합니다.
//!
//! # 방출 정책
//! - 악성 판정: 항상 즉시 방출. 억제 없음.
//! - 정상/기타 판정: 마지막 상태 보고 이후 설정 간격이 지났을 때만 방출.
//!   방출 시 타이머를 지금으로 리셋. 간격 0이면 매번 방출.
//!
//! 악성 알림은 상태 보고 타이머에 영향을 주지 않습니다. 스로틀링은
//! 프로세스 단위이며 흐름(flow) 단위가 아닙니다.

use std::time::Duration;

use tokio::time::Instant;

use connwatch_core::event::AlertEvent;
use connwatch_core::types::{Alert, ConnRecord, Label, Verdict};

/// 알림 스로틀러
///
/// 정상 상태 보고의 마지막 방출 시각을 추적하며, 방출/억제 카운터를
/// 유지합니다.
pub struct AlertThrottler {
    /// 정상 상태 보고 최소 간격 (0이면 매번 보고)
    benign_interval: Duration,
    /// 마지막 정상 상태 보고 방출 시각
    last_status: Option<Instant>,
    /// 방출된 악성 알림 수
    alerts_emitted: u64,
    /// 방출된 정상 상태 보고 수
    status_emitted: u64,
    /// 간격 미충족으로 억제된 상태 보고 수
    status_suppressed: u64,
}

impl AlertThrottler {
    /// 새 스로틀러를 생성합니다. 첫 정상 상태 보고는 즉시 방출됩니다.
    pub fn new(benign_interval: Duration) -> Self {
        Self {
            benign_interval,
            last_status: None,
            alerts_emitted: 0,
            status_emitted: 0,
            status_suppressed: 0,
        }
    }

    /// 판정에 따라 알림 방출 여부를 결정합니다.
    ///
    /// 방출 대상이면 `Some(AlertEvent)`를, 억제되면 `None`을 반환합니다.
    pub fn decide(
        &mut self,
        record: &ConnRecord,
        label: Label,
        verdict: Verdict,
        trace_id: Option<&str>,
    ) -> Option<AlertEvent> {
        match verdict {
            Verdict::Malicious => {
                self.alerts_emitted += 1;
                Some(make_event(record, label, verdict, trace_id))
            }
            Verdict::Benign | Verdict::Other => {
                let now = Instant::now();
                let due = match self.last_status {
                    None => true,
                    Some(last) => now.duration_since(last) >= self.benign_interval,
                };

                if due {
                    self.last_status = Some(now);
                    self.status_emitted += 1;
                    Some(make_event(record, label, verdict, trace_id))
                } else {
                    self.status_suppressed += 1;
                    tracing::debug!(
                        label = %label,
                        verdict = %verdict,
                        "status suppressed by benign interval"
                    );
                    None
                }
            }
        }
    }

    /// 방출된 악성 알림 수를 반환합니다.
    pub fn alerts_emitted(&self) -> u64 {
        self.alerts_emitted
    }

    /// 방출된 정상 상태 보고 수를 반환합니다.
    pub fn status_emitted(&self) -> u64 {
        self.status_emitted
    }

    /// 억제된 상태 보고 수를 반환합니다.
    pub fn status_suppressed(&self) -> u64 {
        self.status_suppressed
    }
}

/// 판정 결과를 AlertEvent로 변환합니다.
fn make_event(
    record: &ConnRecord,
    label: Label,
    verdict: Verdict,
    trace_id: Option<&str>,
) -> AlertEvent {
    let alert = Alert::from_record(record, label, verdict);
    match trace_id {
        Some(tid) => AlertEvent::with_trace(alert, tid),
        None => AlertEvent::new(alert),
    }
}
