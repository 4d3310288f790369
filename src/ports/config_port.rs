//! Configuration access port trait.

pub trait ConfigPort {
    /// Raw value of `key` in `section`, `None` when absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
