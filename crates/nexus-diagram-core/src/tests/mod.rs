mod document;
mod normalize;
mod simplify;
