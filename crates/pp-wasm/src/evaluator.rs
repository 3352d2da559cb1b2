//! Evaluator backed by JavaScript callbacks.
//!
//! The host page registers `evaluate(code, language)`, which returns
//! `{messages, warnings, errors}` (or nothing) and throws on failure,
//! `probe(expression)`, which returns the expression's value, and
//! `reset()`, which starts a fresh environment before each check. A thrown
//! object may carry `name`, `message`, `line` (or `lineNumber`) and `offset`.

use js_sys::{Array, Function, JSON, Reflect};
use pp_core::puzzle::Language;
use pp_editor::{EvalFailure, Evaluator, Transcript};
use wasm_bindgen::JsValue;

pub(crate) struct JsEvaluator {
    evaluate: Function,
    probe: Function,
    reset: Function,
}

impl JsEvaluator {
    pub fn new(evaluate: Function, probe: Function, reset: Function) -> Self {
        Self {
            evaluate,
            probe,
            reset,
        }
    }
}

impl Evaluator for JsEvaluator {
    fn reset(&mut self) {
        if let Err(thrown) = self.reset.call0(&JsValue::NULL) {
            log::error!("evaluator reset failed: {}", failure_from(&thrown));
        }
    }

    fn evaluate(&mut self, code: &str, language: &Language) -> Result<Transcript, EvalFailure> {
        self.evaluate
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(code),
                &JsValue::from_str(language.as_str()),
            )
            .map(|value| transcript_from(&value))
            .map_err(|thrown| failure_from(&thrown))
    }

    fn probe(&mut self, expression: &str) -> Result<String, EvalFailure> {
        self.probe
            .call1(&JsValue::NULL, &JsValue::from_str(expression))
            .map(|value| render_value(&value))
            .map_err(|thrown| failure_from(&thrown))
    }
}

fn field(value: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn line_field(value: &JsValue, key: &str) -> Option<usize> {
    field(value, key)?
        .as_f64()
        .filter(|n| *n >= 0.0)
        .map(|n| n as usize)
}

fn lines(value: &JsValue, key: &str) -> Vec<String> {
    field(value, key)
        .filter(Array::is_array)
        .map(|v| Array::from(&v).iter().filter_map(|l| l.as_string()).collect())
        .unwrap_or_default()
}

fn transcript_from(value: &JsValue) -> Transcript {
    if value.is_undefined() || value.is_null() {
        return Transcript::default();
    }
    Transcript {
        messages: lines(value, "messages"),
        warnings: lines(value, "warnings"),
        errors: lines(value, "errors"),
    }
}

fn failure_from(thrown: &JsValue) -> EvalFailure {
    if let Some(text) = thrown.as_string() {
        return EvalFailure::new("Error", text);
    }
    EvalFailure {
        kind: field(thrown, "name")
            .and_then(|v| v.as_string())
            .unwrap_or_else(|| "Error".to_string()),
        message: field(thrown, "message")
            .and_then(|v| v.as_string())
            .unwrap_or_default(),
        line: line_field(thrown, "line").or_else(|| line_field(thrown, "lineNumber")),
        offset: line_field(thrown, "offset"),
    }
}

fn render_value(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
