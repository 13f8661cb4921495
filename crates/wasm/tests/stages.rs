#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use texmd_wasm::{init_latex, render_stage1, render_stage2, version};
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn protects_and_restores_inline_math() {
    let protected = render_stage1("before $a$ after", JsValue::UNDEFINED).expect("stage1");
    assert!(!protected.contains("$a$"));
    assert!(protected.contains("latex:replace"));

    let restored = render_stage2(&protected, JsValue::UNDEFINED).expect("stage2");
    assert!(restored.contains("<texmd-latex display=\"false\">$a$</texmd-latex>"));
    assert!(!restored.contains("latex:replace"));
}

#[wasm_bindgen_test]
fn escaped_dollar_round_trips() {
    let protected = render_stage1("cost \\$5", JsValue::UNDEFINED).expect("stage1");
    let restored = render_stage2(&protected, JsValue::UNDEFINED).expect("stage2");
    assert_eq!(restored, "cost $5");
}

#[wasm_bindgen_test]
fn honors_config_object() {
    let config = js_sys::JSON::parse(r#"{"inlineMath": [["\\(", "\\)"]]}"#).expect("parse config");
    let protected = render_stage1("\\(x\\) but $y$", config.clone()).expect("stage1");
    let restored = render_stage2(&protected, config).expect("stage2");
    assert!(restored.contains("<texmd-latex display=\"false\">\\(x\\)</texmd-latex>"));
    assert!(restored.contains("$y$"));
}

#[wasm_bindgen_test]
fn init_runs_before_init_hook() {
    let called = Rc::new(Cell::new(false));
    let seen = Rc::clone(&called);
    let hook = Closure::wrap(Box::new(move || seen.set(true)) as Box<dyn FnMut()>);

    let config = js_sys::Object::new();
    js_sys::Reflect::set(&config, &JsValue::from_str("beforeInit"), hook.as_ref())
        .expect("set hook");
    init_latex(config.into()).expect("init");

    assert!(called.get());
}

#[wasm_bindgen_test]
fn init_rejects_empty_delimiters() {
    let config = js_sys::JSON::parse(r#"{"inlineMath": [["", "$"]]}"#).expect("parse config");
    assert!(init_latex(config).is_err());
}

#[wasm_bindgen_test]
fn reports_a_version() {
    assert!(version().contains('.'));
}
