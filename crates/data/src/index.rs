//! Index types. See [`::index_vec`].

pub use index_vec::{Idx, IndexSlice, IndexVec, index_vec};

/// Creates a new index to use with [`::index_vec`].
#[macro_export]
macro_rules! newtype_index {
    () => {};
    ($(#[$attr:meta])* $vis:vis struct $name:ident; $($rest:tt)*) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name(std::num::NonZero<u32>);

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.get())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.get())
            }
        }

        impl $crate::index::Idx for $name {
            #[inline(always)]
            fn from_usize(value: usize) -> Self {
                let value = u32::try_from(value).expect("index overflowed");
                Self::new(value)
            }

            #[inline(always)]
            fn index(self) -> usize {
                self.get() as usize
            }
        }

        impl $name {
            /// Creates a new `$name` from the given `value`.
            #[inline(always)]
            $vis const fn new(value: u32) -> Self {
                let inner_repr = value.checked_add(1).expect("index overflowed");
                Self(std::num::NonZero::new(inner_repr).expect("inner_repr should never be zero"))
            }

            /// Gets the underlying index value.
            #[inline(always)]
            $vis const fn get(self) -> u32 {
                self.0.get() - 1
            }

            /// Returns the current value and advances to the next index.
            #[inline(always)]
            $vis fn get_and_inc(&mut self) -> Self {
                let current = *self;
                *self = Self::new(current.get() + 1);
                current
            }
        }

        $crate::newtype_index!($($rest)*);
    };
}

newtype_index! {
    /// A branch target inside one method body. Label identifiers are only
    /// meaningful within the method that allocated them.
    pub struct LabelId;
    /// A generated instruction in a method's instruction arena.
    pub struct InsnId;
    /// A compiled (or reserved) method in the output module.
    pub struct MethodId;
    /// An external-call method token.
    pub struct TokenId;
}

/// An insertion-ordered set with stable indices and linear membership checks.
pub struct IndexLinearSet<I: Idx, V: PartialEq> {
    inner: IndexVec<I, V>,
}

impl<I: Idx, V: PartialEq> IndexLinearSet<I, V> {
    pub fn new() -> Self {
        Self { inner: IndexVec::new() }
    }

    /// Adds `value`, returning its fresh index, or `Err` with the index of
    /// an equal member already present.
    pub fn add(&mut self, value: V) -> Result<I, I> {
        self.find(&value).map_or(Ok(()), |i| Err(i))?;
        let new_id = self.inner.len_idx();
        self.inner.push(value);
        Ok(new_id)
    }

    pub fn find(&self, value: &V) -> Option<I> {
        self.inner.position(|member| member == value)
    }
}

impl<I: Idx, V: PartialEq> Default for IndexLinearSet<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, V: PartialEq> std::ops::Deref for IndexLinearSet<I, V> {
    type Target = IndexVec<I, V>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
