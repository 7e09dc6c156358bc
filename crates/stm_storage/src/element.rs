//! Fixed-width elements stored big-endian.

/// A fixed-width integer that array and append files can hold.
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decodes from the first `WIDTH` bytes of `bytes`.
    fn read_be(bytes: &[u8]) -> Self;

    /// Encodes into the first `WIDTH` bytes of `out`.
    fn write_be(self, out: &mut [u8]);
}

macro_rules! impl_element {
    ($($ty:ty),*) => {$(
        impl Element for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn read_be(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..Self::WIDTH]);
                <$ty>::from_be_bytes(buf)
            }

            fn write_be(self, out: &mut [u8]) {
                out[..Self::WIDTH].copy_from_slice(&self.to_be_bytes());
            }
        }
    )*};
}

impl_element!(i32, i64);
