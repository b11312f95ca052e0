pub mod collection;
pub mod next;
pub mod note;
pub mod review;
