use std::{env, fs, path::PathBuf};

const API_HOST: &str = "pi.hole";
const API_PORT: u16 = 80;
const API_PATH_PREFIX: &str = "/admin/api.php?disable=60&auth=";
const USER_AGENT: &str = "esp-idf/1.0 esp32";

const SSID_VAR: &str = "BLOCKPAUSE_WIFI_SSID";
const PASSWORD_VAR: &str = "BLOCKPAUSE_WIFI_PASSWORD";
const TOKEN_VAR: &str = "BLOCKPAUSE_API_TOKEN";

fn main() {
    for var in [SSID_VAR, PASSWORD_VAR, TOKEN_VAR] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let ssid = configured(SSID_VAR);
    let password = env::var(PASSWORD_VAR).unwrap_or_default();
    let token = configured(TOKEN_VAR);

    let path = format!("{API_PATH_PREFIX}{}", token.as_deref().unwrap_or(""));
    let request = format!(
        "GET {path} HTTP/1.0\r\nHost: {API_HOST}:{API_PORT}\r\nUser-Agent: {USER_AGENT}\r\n\r\n"
    );

    let generated = format!(
        "// Generated by build.rs from {SSID_VAR}, {PASSWORD_VAR} and {TOKEN_VAR}.\n\
         pub(crate) const WIFI_SSID: Option<&str> = {ssid:?};\n\
         pub(crate) const WIFI_PASSWORD: &str = {password:?};\n\
         pub(crate) const API_TOKEN_CONFIGURED: bool = {token_configured};\n\
         pub(crate) const API_HOST: &str = {API_HOST:?};\n\
         pub(crate) const API_PORT: u16 = {API_PORT};\n\
         pub(crate) const API_PATH: &str = {path:?};\n\
         pub(crate) const API_REQUEST: &str = {request:?};\n",
        token_configured = token.is_some(),
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("missing OUT_DIR"));
    let out_file = out_dir.join("secrets.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", out_file.display()));
}

fn configured(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => {
            println!("cargo:warning={var} is not set; wake cycles will report failure");
            None
        }
    }
}
