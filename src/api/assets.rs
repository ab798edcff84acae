//! Static assets
//!
//! Layout under the configured asset directory:
//! - `s/` public assets, with `s/index.html` as the landing page
//! - `list.html` the protected repository list page

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

pub const PUBLIC_ASSETS_PATH: &str = "/static/s";

/// Public asset tree served under [`PUBLIC_ASSETS_PATH`]
pub fn public_assets(dir: &Path) -> ServeDir {
    ServeDir::new(dir.join("s"))
}

/// Landing page served at `/`
pub fn landing_page(dir: &Path) -> ServeFile {
    ServeFile::new(dir.join("s").join("index.html"))
}

/// Protected list page, only reachable behind the session gate
pub fn protected_page(dir: &Path) -> ServeFile {
    ServeFile::new(dir.join("list.html"))
}
