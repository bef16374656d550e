//! Bundled language defaults.

#[allow(unused)]
macro_rules! config {
    ($config: ty, $lang_code:literal, $file_name:literal) => {{
        let json: &'static str = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/configs/",
            $lang_code,
            "/",
            $file_name,
            ".json"
        ));

        serde_json::from_str::<$config>(json)
    }};
}

#[allow(unused)]
const ERROR_MSG: &str = "bundled configs are pre-tested.";

pub mod es;
