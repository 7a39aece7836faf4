// The panel frontend is embedded into the server binary from
// frontend/dist, and rust_embed insists that folder exists when this
// crate compiles. A checkout that has not run `trunk build` yet gets a
// stub index.html instead, so tests and the operator API work without
// the wasm toolchain installed.

use std::fs;
use std::path::Path;

const STUB_INDEX: &str =
    "<!-- no panel bundle embedded: run `trunk build` in frontend/ first -->\n";

fn main() {
    let dist = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../frontend/dist");

    if !dist.exists() {
        fs::create_dir_all(&dist).expect("failed to create frontend/dist stub");
        fs::write(dist.join("index.html"), STUB_INDEX).expect("failed to write stub index.html");
    }

    println!("cargo:rerun-if-changed=../../frontend/dist");
}
