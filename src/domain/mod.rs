pub mod comment_tree;
pub mod entities;
pub mod value_objects;
