mod url;
mod url_buf;
mod validate;

pub use url::Url;
pub use url_buf::UrlBuf;
pub use validate::{is_path_char, is_url_char};
