mod package;
mod swap;
mod unzip;

pub use package::PackageDownloader;
pub use swap::{install_atomic, sibling_path};
pub use unzip::unzip_into;
