//! Transformer trait for record transformation

use eyre::Result;

/// Transformer trait for transforming data items
///
/// Implementors define one step between a flattened report row and the
/// record that gets emitted:
/// - Date normalization
/// - Schema type coercion
///
/// # Example
/// ```
/// use tap_googleanalytics::etl::Transformer;
/// use eyre::Result;
/// use serde_json::{Map, Value};
///
/// struct Uppercase;
///
/// impl Transformer for Uppercase {
///     type Input = Map<String, Value>;
///     type Output = Map<String, Value>;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         Ok(input
///             .into_iter()
///             .map(|(k, v)| (k.to_uppercase(), v))
///             .collect())
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if transformation fails (validation, conversion, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Chain another transformer after this one
    fn then<T>(self, next: T) -> Chain<Self, T>
    where
        Self: Sized,
        T: Transformer<Input = Self::Output>,
    {
        Chain { first: self, next }
    }
}

/// Two transformers applied in sequence, see [`Transformer::then`]
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    next: B,
}

impl<A, B> Transformer for Chain<A, B>
where
    A: Transformer,
    B: Transformer<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        self.next.transform(self.first.transform(input)?)
    }
}
