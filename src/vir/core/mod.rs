pub mod serdering;
