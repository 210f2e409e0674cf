//! XML helpers shared by the part codecs.

mod escape;
mod reader;

pub use escape::{escape_xml, push_escaped, unescape_xml};
pub use reader::{Attrs, append_general_ref, append_text, attr_name, attr_value};
