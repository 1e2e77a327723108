// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `with`-clause static checks: turns the parsed `OptionArg` list into
//! a `CallOptions` the runtime can act on, plus every `OPTS001..OPTS007`
//! diagnostic and the `E016`/`E017` option-value errors.

use crate::ir::TypedExpr;
use crate::semtype::SemType;
use crate::subtype::is_subtype;
use dflow_syntax::{BackoffKind, Category, Diagnostic, OnErrorKind, OptionArg, OptionValue, Priority, Severity, Span};
use std::time::Duration;

/// A single module call's fully-resolved options, after static validation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CallOptions {
    pub retry: u32,
    pub timeout: Option<Duration>,
    pub delay: Duration,
    pub backoff: BackoffKind,
    pub fallback_ty: Option<SemType>,
    /// The fallback expression itself, retained so the runtime can
    /// evaluate it once retries and/or the module body are exhausted
    ///. `fallback_ty` alone is not enough to execute it.
    pub fallback_expr: Option<Box<TypedExpr>>,
    pub cache: Option<Duration>,
    pub cache_backend: String,
    pub throttle: Option<(i64, Duration)>,
    pub concurrency: Option<u32>,
    pub on_error: OnErrorKind,
    pub lazy: bool,
    pub priority: Priority,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            retry: 0,
            timeout: None,
            delay: Duration::ZERO,
            backoff: BackoffKind::Fixed,
            fallback_ty: None,
            fallback_expr: None,
            cache: None,
            cache_backend: "memory".to_string(),
            throttle: None,
            concurrency: None,
            on_error: OnErrorKind::Propagate,
            lazy: false,
            priority: Priority::Normal,
        }
    }
}

/// Validates and resolves a call's `with` clause. `fallback_checker`
/// synthesizes the type of the `fallback` expression, if present (the
/// caller supplies this so `options.rs` does not depend on `checker.rs`).
pub fn check_options(
    options: &[OptionArg],
    return_type: &SemType,
    mut fallback_checker: impl FnMut(&dflow_syntax::Expr) -> TypedExpr,
) -> (CallOptions, Vec<Diagnostic>) {
    let mut resolved = CallOptions::default();
    let mut diagnostics = Vec::new();
    let mut saw_retry = false;
    let mut saw_delay = false;
    let mut saw_backoff = false;
    let mut saw_cache = false;
    let mut saw_cache_backend = false;

    for opt in options {
        match opt.name.as_str() {
            "retry" => {
                saw_retry = true;
                if let OptionValue::Int(n) = &opt.value {
                    let n = *n;
                    if n < 0 {
                        diagnostics.push(opts_error("OPTS006", "retry must be non-negative", opt.span));
                    } else {
                        if n > 10 {
                            diagnostics.push(opts_warning(
                                    "OPTS005",
                                    format!("retry count {n} is unusually high"),
                                    opt.span,
                            ));
                        }
                        resolved.retry = n as u32;
                    }
                } else {
                    diagnostics.push(invalid_option_value("retry", opt.span));
                }
            }
            "timeout" => {
                if let OptionValue::Duration(d) = &opt.value {
                    resolved.timeout = Some(*d);
                } else {
                    diagnostics.push(invalid_option_value("timeout", opt.span));
                }
            }
            "delay" => {
                saw_delay = true;
                if let OptionValue::Duration(d) = &opt.value {
                    resolved.delay = *d;
                } else {
                    diagnostics.push(invalid_option_value("delay", opt.span));
                }
            }
            "backoff" => {
                saw_backoff = true;
                match &opt.value {
                    OptionValue::Ident(id) => match id.as_str() {
                        "fixed" => resolved.backoff = BackoffKind::Fixed,
                        "linear" => resolved.backoff = BackoffKind::Linear,
                        "exponential" => resolved.backoff = BackoffKind::Exponential,
                        _ => diagnostics.push(invalid_option_value("backoff", opt.span)),
                    },
                    _ => diagnostics.push(invalid_option_value("backoff", opt.span)),
                }
            }
            "fallback" => {
                if let OptionValue::Expr(expr) = &opt.value {
                    let typed = fallback_checker(expr);
                    if !is_subtype(&typed.ty, return_type) {
                        diagnostics.push(fallback_type_mismatch(&typed.ty, return_type, opt.span));
                    }
                    resolved.fallback_ty = Some(typed.ty.clone());
                    resolved.fallback_expr = Some(Box::new(typed));
                } else {
                    diagnostics.push(invalid_option_value("fallback", opt.span));
                }
            }
            "cache" => {
                saw_cache = true;
                if let OptionValue::Duration(d) = &opt.value {
                    resolved.cache = Some(*d);
                } else {
                    diagnostics.push(invalid_option_value("cache", opt.span));
                }
            }
            "cache_backend" => {
                saw_cache_backend = true;
                if let OptionValue::Str(s) = &opt.value {
                    resolved.cache_backend = s.clone();
                } else {
                    diagnostics.push(invalid_option_value("cache_backend", opt.span));
                }
            }
            "throttle" => {
                if let OptionValue::Rate { count, per } = &opt.value {
                    if *count <= 0 {
                        diagnostics.push(invalid_option_value("throttle", opt.span));
                    } else {
                        resolved.throttle = Some((*count, *per));
                    }
                } else {
                    diagnostics.push(invalid_option_value("throttle", opt.span));
                }
            }
            "concurrency" => {
                if let OptionValue::Int(n) = &opt.value {
                    if *n <= 0 {
                        diagnostics.push(opts_error("OPTS007", "concurrency must be positive", opt.span));
                    } else {
                        resolved.concurrency = Some(*n as u32);
                    }
                } else {
                    diagnostics.push(invalid_option_value("concurrency", opt.span));
                }
            }
            "on_error" => match &opt.value {
                OptionValue::Ident(id) => match id.as_str() {
                    "propagate" => resolved.on_error = OnErrorKind::Propagate,
                    "skip" => resolved.on_error = OnErrorKind::Skip,
                    "log" => resolved.on_error = OnErrorKind::Log,
                    "wrap" => resolved.on_error = OnErrorKind::Wrap,
                    _ => diagnostics.push(invalid_option_value("on_error", opt.span)),
                },
                _ => diagnostics.push(invalid_option_value("on_error", opt.span)),
            },
            "lazy" => {
                if let OptionValue::Bool(b) = &opt.value {
                    resolved.lazy = *b;
                } else {
                    diagnostics.push(invalid_option_value("lazy", opt.span));
                }
            }
            "priority" => match &opt.value {
                OptionValue::Ident(id) => match id.as_str() {
                    "critical" => resolved.priority = Priority::Critical,
                    "high" => resolved.priority = Priority::High,
                    "normal" => resolved.priority = Priority::Normal,
                    "low" => resolved.priority = Priority::Low,
                    "background" => resolved.priority = Priority::Background,
                    _ => diagnostics.push(invalid_option_value("priority", opt.span)),
                },
                OptionValue::Int(n) if (0..=100).contains(n) => {
                    resolved.priority = Priority::Numeric(*n as u8)
                }
                _ => diagnostics.push(invalid_option_value("priority", opt.span)),
            },
            _ => {}
        }
    }

    if saw_delay && !saw_retry {
        diagnostics.push(opts_warning("OPTS001", "`delay` has no effect without `retry`", Span::default()));
    }
    if saw_backoff && !saw_delay {
        diagnostics.push(opts_warning("OPTS002", "`backoff` has no effect without `delay`", Span::default()));
    }
    if saw_backoff && !saw_retry {
        diagnostics.push(opts_warning("OPTS003", "`backoff` has no effect without `retry`", Span::default()));
    }
    if saw_cache_backend && !saw_cache {
        diagnostics.push(opts_warning(
                "OPTS004",
                "`cache_backend` has no effect without `cache`",
                Span::default(),
        ));
    }

    (resolved, diagnostics)
}

fn opts_warning(code: &'static str, message: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::new(code, Category::Type, Severity::Warning, message, span)
}

fn opts_error(code: &'static str, message: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::new(code, Category::Type, Severity::Error, message, span)
}

fn invalid_option_value(name: &str, span: Span) -> Diagnostic {
    Diagnostic::new(
        "E016",
        Category::Type,
        Severity::Error,
        format!("invalid value for option `{name}`"),
        span,
    )
}

fn fallback_type_mismatch(found: &SemType, expected: &SemType, span: Span) -> Diagnostic {
    Diagnostic::new(
        "E017",
        Category::Type,
        Severity::Error,
        format!("fallback type {found} is not assignable to return type {expected}"),
        span,
    )
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
