//! Unified error taxonomy for the Backforge generation orchestrator.
//!
//! Every Backforge error carries an [`ErrorCode`] (a machine-readable,
//! stable tag), a human-readable message, an optional cause chain, and
//! arbitrary key-value context. Use the builder returned by
//! [`BfError::new`] to construct errors fluently. Component-local error
//! enums map onto this taxonomy via an `error_code()` method rather than
//! replacing it, so a `Project`'s persisted failure report always carries a
//! code from this one table regardless of which stage produced it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Prompt→Spec generation (C3).
    Generation,
    /// Spec review (C5).
    Review,
    /// Template rendering / archive assembly (external collaborators, §6).
    Render,
    /// Sandbox deploy and repair loop (C7).
    Sandbox,
    /// LLM provider routing (C4).
    Llm,
    /// Document ingestion and retrieval (C2).
    Retrieval,
    /// Tenancy / ownership checks.
    Tenancy,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Generation => "generation",
            Self::Review => "review",
            Self::Render => "render",
            Self::Sandbox => "sandbox",
            Self::Llm => "llm",
            Self::Retrieval => "retrieval",
            Self::Tenancy => "tenancy",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code (§7).
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Generation (C3) --
    /// The spec agent exhausted its self-correction retries or the LLM
    /// fallback chain; terminal for the pipeline.
    SpecGenerationFailed,
    /// The same model returned invalid JSON / an invariant-violating spec
    /// `max_retries` times in a row.
    ValidationExhausted,

    // -- Review (C5) --
    /// The spec reviewer rejected the spec; terminal.
    SpecInvalid,

    // -- Render (external collaborators, §6) --
    /// The templating collaborator failed to render a spec into files.
    RenderFailed,

    // -- Sandbox (C7) --
    /// The sandbox could not bring the container group up.
    SandboxDeployFailed,
    /// The health endpoint never returned 200 before the deadline.
    SandboxHealthTimeout,
    /// One or more synthetic endpoint tests failed.
    EndpointTestFailure,

    // -- LLM (C4) --
    /// Every model in the fallback chain returned quota-exhausted.
    AllModelsExhausted,
    /// A single provider call hit a quota / rate-limit signal.
    QuotaExhausted,
    /// A transient network error (timeout, 5xx).
    NetworkTransient,
    /// The model returned unparseable or non-conforming output.
    SchemaInvalid,
    /// A non-recoverable provider error (auth, permission, malformed request).
    Terminal,

    // -- Retrieval (C2) --
    /// The uploaded document's extension is not supported.
    UnsupportedDocument,
    /// The uploaded document exceeds the size ceiling.
    DocumentTooLarge,

    // -- Tenancy --
    /// The requested record does not exist for this caller (no existence leak).
    NotFound,
    /// The caller is not permitted to perform the requested action.
    Forbidden,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SpecGenerationFailed | Self::ValidationExhausted => ErrorCategory::Generation,
            Self::SpecInvalid => ErrorCategory::Review,
            Self::RenderFailed => ErrorCategory::Render,
            Self::SandboxDeployFailed
            | Self::SandboxHealthTimeout
            | Self::EndpointTestFailure => ErrorCategory::Sandbox,
            Self::AllModelsExhausted
            | Self::QuotaExhausted
            | Self::NetworkTransient
            | Self::SchemaInvalid
            | Self::Terminal => ErrorCategory::Llm,
            Self::UnsupportedDocument | Self::DocumentTooLarge => ErrorCategory::Retrieval,
            Self::NotFound | Self::Forbidden => ErrorCategory::Tenancy,
            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation (e.g. `"SPEC_INVALID"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecGenerationFailed => "SPEC_GENERATION_FAILED",
            Self::ValidationExhausted => "VALIDATION_EXHAUSTED",
            Self::SpecInvalid => "SPEC_INVALID",
            Self::RenderFailed => "RENDER_FAILED",
            Self::SandboxDeployFailed => "SANDBOX_DEPLOY_FAILED",
            Self::SandboxHealthTimeout => "SANDBOX_HEALTH_TIMEOUT",
            Self::EndpointTestFailure => "ENDPOINT_TEST_FAILURE",
            Self::AllModelsExhausted => "ALL_MODELS_EXHAUSTED",
            Self::QuotaExhausted => "QUOTA_EXHAUSTED",
            Self::NetworkTransient => "NETWORK_TRANSIENT",
            Self::SchemaInvalid => "SCHEMA_INVALID",
            Self::Terminal => "TERMINAL",
            Self::UnsupportedDocument => "UNSUPPORTED_DOCUMENT",
            Self::DocumentTooLarge => "DOCUMENT_TOO_LARGE",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BfError
// ---------------------------------------------------------------------------

/// Unified Backforge error.
///
/// ```
/// use bf_error::{BfError, ErrorCode};
///
/// let err = BfError::new(ErrorCode::QuotaExhausted, "gemini-2.0-flash exhausted")
///     .with_context("model", "gemini-2.0-flash")
///     .with_context("attempt", 3);
/// ```
pub struct BfError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl BfError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Debug for BfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("BfError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for BfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for BfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Serialization support — for the Project's persisted failure report (§7)
// ---------------------------------------------------------------------------

/// Serialisable snapshot of a [`BfError`] (without the opaque source), meant
/// to be embedded in a `Project`'s persisted JSON artifact slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BfErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&BfError> for BfErrorDto {
    fn from(err: &BfError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<BfErrorDto> for BfError {
    fn from(dto: BfErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}
