//! Token model shared between the match finder and whatever entropy coder consumes its output.
//! The match finder only ever appends to a sink, the Huffman stage reads the tokens and the
//! histograms back out.

pub mod deflate_constants;
pub mod deflate_token;
