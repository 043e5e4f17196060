// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people submitting a photo.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how a front end presents it; `retriable` tells the
// caller whether resubmitting the same photo could succeed. The pipeline
// itself never retries.

use crate::error::{PasswerkError, PipelineError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Engine hiccup or timeout. Trying again may work.
    Transient,
    /// The user must supply a different photo or settings.
    ActionRequired,
    /// Cannot be fixed by retrying or by the user.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether resubmitting unchanged input might succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `PasswerkError` into a `HumanError`.
pub fn humanize_error(err: &PasswerkError) -> HumanError {
    match err {
        PasswerkError::InputDecode(_) => HumanError {
            message: "We couldn't open this photo.".into(),
            suggestion: "The file may be damaged or in an unusual format. Try a JPEG or PNG photo.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PasswerkError::Segmentation(detail) => humanize_engine_error(detail),

        PasswerkError::SegmentationTimeout(_) => HumanError {
            message: "Cutting out the background took too long.".into(),
            suggestion: "The background removal service is busy. Please try again in a moment.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PasswerkError::SegmentationCancelled => HumanError {
            message: "Processing was stopped.".into(),
            suggestion: "Submit the photo again when you're ready.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PasswerkError::EmptyForeground(_) => HumanError {
            message: "We couldn't find a person in this photo.".into(),
            suggestion: "Use a photo where your head and shoulders are clearly visible against the background, or lower the zoom.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PasswerkError::Encoding(_) => HumanError {
            message: "We couldn't save the finished photo.".into(),
            suggestion: "Try again, or choose a different output format.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PasswerkError::InvalidConfig(detail) => HumanError {
            message: "Some settings aren't valid.".into(),
            suggestion: format!("Check the settings and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PasswerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the photo to a different folder first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PasswerkError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check that the settings file is valid JSON.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Humanize a stage-tagged pipeline failure.
pub fn humanize_pipeline_error(err: &PipelineError) -> HumanError {
    humanize_error(&err.source)
}

/// Parse segmentation engine details into human-readable messages.
fn humanize_engine_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("connect") {
        HumanError {
            message: "We couldn't reach the background removal service.".into(),
            suggestion: "Check that the service is running and the address is correct, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("status 5") {
        HumanError {
            message: "The background removal service had an internal problem.".into(),
            suggestion: "Please try again in a moment.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("dimension") || lower.contains("decode") {
        HumanError {
            message: "The background removal service returned an unusable result.".into(),
            suggestion: "This is usually a service misconfiguration. Please report it.".into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "Background removal didn't work on this photo.".into(),
            suggestion: format!("Try again, or use a photo with a plainer background. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
