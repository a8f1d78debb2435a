mod inverted;

pub use inverted::{tokenize, IndexInfo, KeywordIndex};
