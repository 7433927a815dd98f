//! Unit tests for error handling
//!
//! Tests error types, conversions, and error message formatting.

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::TutorRagError;
    use crate::Result;

    // ====== Error Type Tests ======

    #[test]
    fn test_embedding_backend_error_names_batch() {
        let error = TutorRagError::EmbeddingBackend {
            batch_index: 3,
            reason: "timeout".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("batch 3"));
        assert!(display.contains("timeout"));
    }

    #[test]
    fn test_data_shape_error_names_field() {
        let error = TutorRagError::DataShape {
            category: "word_problems".to_string(),
            index: 2,
            field: "sentence".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("word_problems"));
        assert!(display.contains("index 2"));
        assert!(display.contains("'sentence'"));
    }

    #[test]
    fn test_dimension_mismatch_error() {
        let error = TutorRagError::DimensionMismatch {
            collection: "card_check".to_string(),
            expected: 8,
            actual: 4,
        };
        assert_eq!(
            error.to_string(),
            "Dimension mismatch in collection card_check: expected 8, got 4"
        );
    }

    #[test]
    fn test_config_error() {
        let error = TutorRagError::ConfigError("Invalid configuration".to_string());
        assert!(matches!(error, TutorRagError::ConfigError(_)));
        assert!(error.to_string().contains("Configuration error"));
    }

    // ====== Not Found Tests ======

    #[test]
    fn test_is_not_found() {
        assert!(TutorRagError::CollectionNotFound("x".to_string()).is_not_found());
        assert!(!TutorRagError::InvalidInput("x".to_string()).is_not_found());
        assert!(!TutorRagError::GenerationBackend("x".to_string()).is_not_found());
    }

    // ====== Error Conversion Tests ======

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: TutorRagError = io_err.into();
        assert!(matches!(err, TutorRagError::Io(_)));
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: TutorRagError = json_err.into();
        assert!(matches!(err, TutorRagError::Serialization(_)));
    }

    #[test]
    fn test_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
        let err: TutorRagError = toml_err.into();
        assert!(matches!(err, TutorRagError::TomlParsing(_)));
    }

    #[tokio::test]
    async fn test_error_from_join() {
        let handle = tokio::spawn(async { panic!("worker died") });
        let join_err = handle.await.unwrap_err();
        let err: TutorRagError = join_err.into();
        assert!(matches!(err, TutorRagError::Join(_)));
    }

    // ====== Propagation Tests ======

    fn parse_port(raw: &str) -> Result<u16> {
        raw.parse()
            .map_err(|_| TutorRagError::InvalidInput(format!("bad port: {raw}")))
    }

    fn read_missing() -> Result<String> {
        Ok(std::fs::read_to_string("/definitely/not/here")?)
    }

    #[test]
    fn test_question_mark_propagation() {
        assert_eq!(parse_port("8000").unwrap(), 8000);
        assert!(matches!(
            parse_port("eighty"),
            Err(TutorRagError::InvalidInput(_))
        ));
        assert!(matches!(read_missing(), Err(TutorRagError::Io(_))));
    }
}
