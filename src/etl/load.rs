//! Loader trait for emitting items to a destination

use eyre::Result;

/// Loader trait for loading data to a destination
///
/// Items are handed over one at a time as soon as they are ready; a loader
/// must not hold them back waiting for more.
///
/// # Example
/// ```
/// use tap_googleanalytics::etl::Loader;
/// use eyre::Result;
///
/// struct LineCounter(usize);
///
/// impl Loader for LineCounter {
///     type Item = String;
///
///     fn load(&mut self, _item: Self::Item) -> Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Loader {
    /// The type of items to load
    type Item;

    /// Load a single item to the destination
    ///
    /// # Errors
    /// Returns an error if loading fails (I/O, serialization, etc.)
    fn load(&mut self, item: Self::Item) -> Result<()>;
}

impl<L: Loader + ?Sized> Loader for &mut L {
    type Item = L::Item;

    fn load(&mut self, item: Self::Item) -> Result<()> {
        (**self).load(item)
    }
}
