//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `connwatch_`
//! - 모듈명: `monitor_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use connwatch_core::metrics;
//! use metrics::counter;
//!
//! counter!(connwatch_core::metrics::MONITOR_RECORDS_DECODED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 판정 레이블 키 (malicious, benign, other)
pub const LABEL_VERDICT: &str = "verdict";

/// 프로토콜 레이블 키 (tcp, udp, icmp, other)
pub const LABEL_PROTOCOL: &str = "protocol";

/// 모듈 레이블 키
pub const LABEL_MODULE: &str = "module";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Monitor 메트릭 ─────────────────────────────────────────────────

/// Monitor: 읽어들인 전체 줄 수 (counter)
pub const MONITOR_LINES_READ_TOTAL: &str = "connwatch_monitor_lines_read_total";

/// Monitor: 디코딩된 레코드 수 (counter)
pub const MONITOR_RECORDS_DECODED_TOTAL: &str = "connwatch_monitor_records_decoded_total";

/// Monitor: 디코딩 에러 수 (counter)
pub const MONITOR_DECODE_ERRORS_TOTAL: &str = "connwatch_monitor_decode_errors_total";

/// Monitor: 분류 에러 수 (counter)
pub const MONITOR_CLASSIFY_ERRORS_TOTAL: &str = "connwatch_monitor_classify_errors_total";

/// Monitor: 발행된 악성 알림 수 (counter)
pub const MONITOR_ALERTS_EMITTED_TOTAL: &str = "connwatch_monitor_alerts_emitted_total";

/// Monitor: 발행된 정상 상태 보고 수 (counter)
pub const MONITOR_STATUS_EMITTED_TOTAL: &str = "connwatch_monitor_status_emitted_total";

/// Monitor: 주기 제한으로 억제된 상태 보고 수 (counter)
pub const MONITOR_STATUS_SUPPRESSED_TOTAL: &str = "connwatch_monitor_status_suppressed_total";

/// Monitor: 감지된 로그 로테이션 수 (counter)
pub const MONITOR_ROTATIONS_TOTAL: &str = "connwatch_monitor_rotations_total";

/// Monitor: 폴링 I/O 에러 수 (counter)
pub const MONITOR_POLL_ERRORS_TOTAL: &str = "connwatch_monitor_poll_errors_total";

/// Monitor: 폴링 1회 처리 시간 (histogram, 초)
pub const MONITOR_POLL_DURATION_SECONDS: &str = "connwatch_monitor_poll_duration_seconds";

/// Monitor: 현재 테일 오프셋 (gauge, 바이트)
pub const MONITOR_TAIL_OFFSET_BYTES: &str = "connwatch_monitor_tail_offset_bytes";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "connwatch_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, labels: version)
pub const DAEMON_BUILD_INFO: &str = "connwatch_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 폴링 처리 시간 히스토그램 버킷 (초)
///
/// 100us ~ 10s 범위, 로그 단위 분포
pub const POLL_DURATION_BUCKETS: [f64; 10] = [
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`, `describe_histogram!()`을
/// 호출하여 레코더의 HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `connwatch-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Monitor
    describe_counter!(
        MONITOR_LINES_READ_TOTAL,
        "Total number of raw lines read from the watched conn.log"
    );
    describe_counter!(
        MONITOR_RECORDS_DECODED_TOTAL,
        "Total number of conn.log records successfully decoded"
    );
    describe_counter!(
        MONITOR_DECODE_ERRORS_TOTAL,
        "Total number of lines rejected by the record decoder"
    );
    describe_counter!(
        MONITOR_CLASSIFY_ERRORS_TOTAL,
        "Total number of per-record classification failures"
    );
    describe_counter!(
        MONITOR_ALERTS_EMITTED_TOTAL,
        "Total number of malicious alerts emitted"
    );
    describe_counter!(
        MONITOR_STATUS_EMITTED_TOTAL,
        "Total number of benign status reports emitted"
    );
    describe_counter!(
        MONITOR_STATUS_SUPPRESSED_TOTAL,
        "Total number of benign status reports suppressed by the interval"
    );
    describe_counter!(
        MONITOR_ROTATIONS_TOTAL,
        "Total number of log rotations detected"
    );
    describe_counter!(
        MONITOR_POLL_ERRORS_TOTAL,
        "Total number of transient I/O failures while polling"
    );
    describe_histogram!(
        MONITOR_POLL_DURATION_SECONDS,
        "Time to complete a single poll cycle in seconds"
    );
    describe_gauge!(
        MONITOR_TAIL_OFFSET_BYTES,
        "Current byte offset of the tail reader into the watched file"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Connwatch daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
