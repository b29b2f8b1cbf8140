// Browser smoke tests: `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn rejects_malformed_config() {
    assert!(cursed_corridors::configure("{\"level_count\": 0}").is_err());
    assert!(cursed_corridors::configure("not json").is_err());
}

#[wasm_bindgen_test]
fn start_builds_missing_dom_and_runs_level_one() {
    cursed_corridors::start_game().expect("start");
    let doc = web_sys::window().unwrap().document().unwrap();
    assert!(doc.get_element_by_id("jumpscareCanvas").is_some());
    assert!(doc.get_element_by_id("key").is_some());

    let json = cursed_corridors::ui_state_json().expect("booted");
    assert!(json.contains("\"phase\":\"LevelActive\""), "{json}");
    assert!(json.contains("Level 1 / 10"), "{json}");

    // config is frozen once the session exists
    assert!(cursed_corridors::configure("{}").is_err());
}
