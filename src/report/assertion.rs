//! Comparisons an assertion can check.

/// Values that can be tested against zero.
pub trait IsZero {
    fn is_zero(&self) -> bool;
}

macro_rules! impl_is_zero {
    ($($t:ty),*) => {
        $(impl IsZero for $t {
            fn is_zero(&self) -> bool {
                *self == 0 as $t
            }
        })*
    };
}

impl_is_zero!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl IsZero for bool {
    fn is_zero(&self) -> bool {
        !*self
    }
}

impl<T: IsZero + ?Sized> IsZero for &T {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

/// How an assertion's value is judged. The symbol is printed after the
/// expression on a failure's `code:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Passes when the value is zero.
    EqualsZero,
    /// Passes when the value is not zero.
    NotEqualsZero,
    /// Passes when a boolean condition holds.
    IsTrue,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::EqualsZero => "== 0",
            Comparison::NotEqualsZero => "!= 0",
            Comparison::IsTrue => "is true",
        }
    }

    pub fn evaluate<V: IsZero + ?Sized>(&self, value: &V) -> bool {
        match self {
            Comparison::EqualsZero => value.is_zero(),
            Comparison::NotEqualsZero | Comparison::IsTrue => !value.is_zero(),
        }
    }
}
