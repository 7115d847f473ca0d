pub mod eventing;
