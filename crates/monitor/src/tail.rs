//! conn.log 테일 리더
//!
//! Zeek conn.log 파일을 주기적으로 폴링하며 새로 추가된 줄을 읽습니다.
//! `tail -f`와 유사한 동작을 비동기 방식으로 구현합니다.
//!
//! # 동작 규칙
//! - 개행으로 완결된 줄만 소비합니다. 쓰다 만 줄은 다음 폴링에서 읽습니다.
//! - 파일 크기가 오프셋보다 작아지면 로테이션으로 판정하고 처음부터 다시 읽습니다.
//! - 파일이 없으면 [`TailOutcome::Missing`]을 반환하고 오프셋을 유지합니다.
//! - 파일 핸들은 폴링 동안만 유지합니다. logrotate가 파일을 교체해도
//!   오래된 핸들이 남지 않습니다.

use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tracing::{debug, warn};

use crate::error::MonitorError;

/// 한 번의 폴링 결과
#[derive(Debug, Clone, PartialEq)]
pub enum TailOutcome {
    /// 새로 완결된 줄 목록 (없으면 빈 목록)
    Lines(Vec<Bytes>),
    /// 로테이션 감지 후 파일 처음부터 읽은 줄 목록
    Rotated(Vec<Bytes>),
    /// 파일이 존재하지 않음
    Missing,
}

/// conn.log 테일 리더
///
/// 바이트 오프셋 커서를 유지하며 폴링마다 커서 이후의 완결된 줄을
/// 반환합니다. 커서는 반환한 줄의 마지막 개행 직후로만 전진합니다.
pub struct TailReader {
    /// 감시 대상 파일 경로
    path: PathBuf,
    /// 다음 읽기 시작 위치 (바이트 오프셋)
    offset: u64,
    /// 한 줄 최대 길이 (초과 시 해당 줄 폐기, 오프셋은 전진)
    max_line_length: usize,
    /// 폴링 1회당 최대 소비 줄 수 (초과분은 다음 폴링으로 이월)
    max_lines_per_poll: usize,
    /// 지금까지 반환한 줄 수
    lines_read: u64,
    /// 감지한 로테이션 횟수
    rotations: u64,
}

impl TailReader {
    /// 새 테일 리더를 생성합니다. 커서는 파일 시작(0)에서 출발합니다.
    pub fn new(
        path: impl Into<PathBuf>,
        max_line_length: usize,
        max_lines_per_poll: usize,
    ) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            max_line_length,
            max_lines_per_poll,
            lines_read: 0,
            rotations: 0,
        }
    }

    /// 파일을 한 번 폴링하여 새로 완결된 줄을 읽습니다.
    ///
    /// I/O 에러 시 오프셋은 변경되지 않으므로 다음 폴링에서 같은 위치부터
    /// 다시 시도합니다.
    pub async fn poll(&mut self) -> Result<TailOutcome, MonitorError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TailOutcome::Missing);
            }
            Err(e) => {
                return Err(MonitorError::Tail {
                    path: self.path.display().to_string(),
                    reason: format!("failed to stat file: {e}"),
                });
            }
        };

        let size = metadata.len();

        // 파일이 줄어들었으면 로테이션 (truncation 또는 새 파일로 교체)
        if size < self.offset {
            debug!(
                path = %self.path.display(),
                old_offset = self.offset,
                new_size = size,
                "file shrank, assuming rotation"
            );
            // 재읽기가 실패해도 커서 리셋은 유지됩니다
            self.offset = 0;
            self.rotations += 1;
            let lines = self.read_forward().await?;
            return Ok(TailOutcome::Rotated(lines));
        }

        if size == self.offset {
            return Ok(TailOutcome::Lines(Vec::new()));
        }

        let lines = self.read_forward().await?;
        Ok(TailOutcome::Lines(lines))
    }

    /// 현재 오프셋부터 완결된 줄을 읽고 커서를 전진시킵니다.
    async fn read_forward(&mut self) -> Result<Vec<Bytes>, MonitorError> {
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // stat과 open 사이에 파일이 사라짐. 다음 폴링이 Missing으로 처리합니다.
                debug!(path = %self.path.display(), "file vanished between stat and open");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(MonitorError::Tail {
                    path: self.path.display().to_string(),
                    reason: format!("failed to open file: {e}"),
                });
            }
        };

        // 열린 핸들 기준의 크기를 사용해 stat 이후의 변경에 흔들리지 않습니다
        let size = file
            .metadata()
            .await
            .map_err(|e| MonitorError::Tail {
                path: self.path.display().to_string(),
                reason: format!("failed to stat open file: {e}"),
            })?
            .len();

        if size <= self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))
            .await
            .map_err(|e| MonitorError::Tail {
                path: self.path.display().to_string(),
                reason: format!("failed to seek to offset {}: {e}", self.offset),
            })?;

        let span = size - self.offset;
        let mut buf = Vec::with_capacity(span.min(1024 * 1024) as usize);
        file.take(span)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| MonitorError::Tail {
                path: self.path.display().to_string(),
                reason: format!("failed to read file: {e}"),
            })?;

        // 마지막 개행까지만 완결된 줄로 취급합니다
        let Some(last_nl) = buf.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };

        let mut lines = Vec::new();
        let mut consumed = 0usize;
        let mut count = 0usize;
        let mut start = 0usize;

        while start <= last_nl && count < self.max_lines_per_poll {
            // last_nl 이전 구간이므로 개행은 항상 존재합니다
            let nl = match buf[start..=last_nl].iter().position(|&b| b == b'\n') {
                Some(i) => start + i,
                None => break,
            };
            let line = &buf[start..nl];
            consumed += nl - start + 1;
            count += 1;

            if line.len() > self.max_line_length {
                warn!(
                    path = %self.path.display(),
                    length = line.len(),
                    max = self.max_line_length,
                    "line exceeds max length, dropping"
                );
            } else {
                lines.push(Bytes::copy_from_slice(line));
            }

            start = nl + 1;
        }

        self.offset += consumed as u64;
        self.lines_read += lines.len() as u64;

        Ok(lines)
    }

    /// 감시 대상 파일 경로를 반환합니다.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// 현재 커서 위치(바이트 오프셋)를 반환합니다.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 지금까지 반환한 줄 수를 반환합니다.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// 감지한 로테이션 횟수를 반환합니다.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn reader_for(path: &std::path::Path) -> TailReader {
        TailReader::new(path, 64 * 1024, 10_000)
    }

    fn append(path: &std::path::Path, content: &str) {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn missing_file_returns_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        let mut reader = reader_for(&path);

        assert_eq!(reader.poll().await.unwrap(), TailOutcome::Missing);
        assert_eq!(reader.offset(), 0);
    }

    #[tokio::test]
    async fn empty_file_yields_no_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        std::fs::write(&path, "").unwrap();
        let mut reader = reader_for(&path);

        assert_eq!(reader.poll().await.unwrap(), TailOutcome::Lines(Vec::new()));
        assert_eq!(reader.offset(), 0);
    }

    #[tokio::test]
    async fn reads_appended_complete_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        append(&path, "first line\nsecond line\n");
        let mut reader = reader_for(&path);

        let TailOutcome::Lines(lines) = reader.poll().await.unwrap() else {
            panic!("expected Lines");
        };
        assert_eq!(lines.len(), 2);
        assert_eq!(&lines[0][..], b"first line");
        assert_eq!(&lines[1][..], b"second line");
        assert_eq!(reader.offset(), 23);
        assert_eq!(reader.lines_read(), 2);
    }

    #[tokio::test]
    async fn partial_line_is_not_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        append(&path, "incomplete");
        let mut reader = reader_for(&path);

        assert_eq!(reader.poll().await.unwrap(), TailOutcome::Lines(Vec::new()));
        assert_eq!(reader.offset(), 0);

        // 줄이 완결되면 전체가 한 줄로 읽힙니다
        append(&path, " now done\nnext\n");
        let TailOutcome::Lines(lines) = reader.poll().await.unwrap() else {
            panic!("expected Lines");
        };
        assert_eq!(&lines[0][..], b"incomplete now done");
        assert_eq!(&lines[1][..], b"next");
    }

    #[tokio::test]
    async fn offset_advances_only_past_complete_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        append(&path, "done\npartial");
        let mut reader = reader_for(&path);

        let TailOutcome::Lines(lines) = reader.poll().await.unwrap() else {
            panic!("expected Lines");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(reader.offset(), 5);

        // 미완결 부분은 그대로 남아 다음 폴링을 기다립니다
        assert_eq!(reader.poll().await.unwrap(), TailOutcome::Lines(Vec::new()));
        assert_eq!(reader.offset(), 5);
    }

    #[tokio::test]
    async fn truncation_is_reported_as_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        append(&path, "old line one\nold line two\n");
        let mut reader = reader_for(&path);
        reader.poll().await.unwrap();
        assert_eq!(reader.offset(), 26);

        // truncate 후 더 짧은 내용으로 교체
        std::fs::write(&path, "fresh\n").unwrap();
        let TailOutcome::Rotated(lines) = reader.poll().await.unwrap() else {
            panic!("expected Rotated");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(&lines[0][..], b"fresh");
        assert_eq!(reader.offset(), 6);
        assert_eq!(reader.rotations(), 1);
    }

    #[tokio::test]
    async fn rotation_to_empty_file_resets_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        append(&path, "content before rotate\n");
        let mut reader = reader_for(&path);
        reader.poll().await.unwrap();

        std::fs::write(&path, "").unwrap();
        let TailOutcome::Rotated(lines) = reader.poll().await.unwrap() else {
            panic!("expected Rotated");
        };
        assert!(lines.is_empty());
        assert_eq!(reader.offset(), 0);
    }

    #[tokio::test]
    async fn max_lines_per_poll_caps_each_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        append(&path, "l1\nl2\nl3\nl4\nl5\n");
        let mut reader = TailReader::new(&path, 64 * 1024, 2);

        let TailOutcome::Lines(batch1) = reader.poll().await.unwrap() else {
            panic!("expected Lines");
        };
        assert_eq!(batch1.len(), 2);

        let TailOutcome::Lines(batch2) = reader.poll().await.unwrap() else {
            panic!("expected Lines");
        };
        assert_eq!(batch2.len(), 2);

        let TailOutcome::Lines(batch3) = reader.poll().await.unwrap() else {
            panic!("expected Lines");
        };
        assert_eq!(batch3.len(), 1);
        assert_eq!(&batch3[0][..], b"l5");
        assert_eq!(reader.lines_read(), 5);
    }

    #[tokio::test]
    async fn overlong_line_is_dropped_but_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        let long = "x".repeat(100);
        append(&path, &format!("{long}\nshort\n"));
        let mut reader = TailReader::new(&path, 16, 10_000);

        let TailOutcome::Lines(lines) = reader.poll().await.unwrap() else {
            panic!("expected Lines");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(&lines[0][..], b"short");
        // 폐기된 줄의 바이트도 커서는 지나갑니다
        assert_eq!(reader.offset(), 107);
    }

    #[tokio::test]
    async fn file_created_after_missing_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        let mut reader = reader_for(&path);

        assert_eq!(reader.poll().await.unwrap(), TailOutcome::Missing);

        append(&path, "late arrival\n");
        let TailOutcome::Lines(lines) = reader.poll().await.unwrap() else {
            panic!("expected Lines");
        };
        assert_eq!(&lines[0][..], b"late arrival");
    }

    #[tokio::test]
    async fn offset_never_decreases_without_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conn.log");
        append(&path, "one\n");
        let mut reader = reader_for(&path);

        let mut last_offset = 0;
        for chunk in ["two\n", "", "three\nfour", "\n", ""] {
            append(&path, chunk);
            reader.poll().await.unwrap();

            let offset = reader.offset();
            let size = std::fs::metadata(&path).unwrap().len();
            assert!(offset >= last_offset, "offset went backwards: {offset}");
            assert!(offset <= size, "offset {offset} beyond file size {size}");
            last_offset = offset;
        }
        assert_eq!(last_offset, 19);
    }
}
