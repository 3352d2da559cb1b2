//! Puzzle list loading over `XMLHttpRequest`.

use pp_core::error::PuzzleError;
use pp_core::puzzle::Puzzle;
use pp_core::resource::{handle_response, resolve_relative};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::XmlHttpRequest;

/// Fetch the puzzle list at `url` (relative to the page) and hand the
/// parsed list, or the reason there is none, to `on_loaded`. A request that
/// crashes outright is only logged.
pub(crate) fn load_puzzles(
    url: &str,
    on_loaded: impl FnOnce(Result<Vec<Puzzle>, PuzzleError>) + 'static,
) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let resolved = resolve_relative(&window.location().href()?, url);
    log::debug!("loading puzzles from {resolved}");

    let xhr = XmlHttpRequest::new()?;
    xhr.override_mime_type("application/json")?;
    xhr.open("GET", &resolved)?;

    let request = xhr.clone();
    let target = resolved.clone();
    let onload = Closure::once(move || {
        let status = request.status().unwrap_or(0);
        let body = request.response_text().ok().flatten().unwrap_or_default();
        on_loaded(handle_response(status, &target, &body));
    });
    xhr.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();

    let target = resolved.clone();
    let onerror = Closure::once(move || {
        log::error!("failed to load puzzles from '{target}' (request crashed)");
    });
    xhr.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    if let Err(e) = xhr.send() {
        log::error!("failed to load puzzles from '{resolved}' (request crashed): {e:?}");
    }
    Ok(())
}
