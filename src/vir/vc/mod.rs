pub mod proving;
