//! 모델 파일 로더 -- YAML 모델 아티팩트를 디스크에서 로드합니다.
//!
//! 모델은 단일 YAML 파일이며 시작 시 한 번 로드됩니다.
//! 로드 실패는 치명적 에러로 전파되어 파이프라인 기동을 중단시킵니다.

use std::path::Path;

use crate::error::MonitorError;

use super::artifact::ModelArtifact;

/// 모델 파일 로더 설정
const MAX_MODEL_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const MAX_MODEL_RULES: usize = 10_000;

/// 모델 파일 로더
pub struct ModelLoader;

impl ModelLoader {
    /// 단일 YAML 파일에서 모델 아티팩트를 로드합니다.
    ///
    /// # Errors
    /// - 파일을 읽을 수 없는 경우
    /// - 파일 크기가 `MAX_MODEL_FILE_SIZE`를 초과하는 경우
    /// - YAML 파싱 또는 유효성 검증에 실패한 경우
    pub async fn load_file(path: impl AsRef<Path>) -> Result<ModelArtifact, MonitorError> {
        let path = path.as_ref();

        // 파일 크기 검증
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| MonitorError::ModelLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_MODEL_FILE_SIZE {
            return Err(MonitorError::ModelLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_MODEL_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| MonitorError::ModelLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        let artifact = Self::parse_yaml(&content, &path.display().to_string())?;

        tracing::info!(
            path = %path.display(),
            model = %artifact.name,
            version = artifact.version,
            rules = artifact.rules.len(),
            "loaded classification model"
        );

        Ok(artifact)
    }

    /// YAML 문자열을 파싱하여 모델 아티팩트를 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<ModelArtifact, MonitorError> {
        let artifact: ModelArtifact =
            serde_yaml::from_str(yaml_str).map_err(|e| MonitorError::ModelLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        if artifact.rules.len() > MAX_MODEL_RULES {
            return Err(MonitorError::ModelLoad {
                path: source.to_owned(),
                reason: format!("too many rules: max {MAX_MODEL_RULES}"),
            });
        }

        // 유효성 검증
        artifact.validate()?;

        Ok(artifact)
    }
}
