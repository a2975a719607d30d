//! Identity keys: addresses compared by value of the address, never by the
//! contents they point at.
//!
//! The table never dereferences a key. Anything that can report a stable
//! address can be used as one by implementing [`Identity`].

use core::fmt;
use core::ptr::NonNull;

/// Number of low address bits discarded before bucket selection.
///
/// Allocations on 64-bit pointer targets are at least 8-byte aligned, and at
/// least 4-byte aligned on narrower targets; those low bits are always zero
/// and carry no entropy.
#[cfg(target_pointer_width = "64")]
pub const ALIGN_SHIFT: u32 = 3;
#[cfg(not(target_pointer_width = "64"))]
pub const ALIGN_SHIFT: u32 = 2;

/// Hash of an address: the address with its alignment bits shifted out.
///
/// Only meaningful for aligned allocation addresses. Unaligned or non-pointer
/// keys still work, but collide more.
#[inline]
pub const fn identity_hash(addr: usize) -> usize {
    addr >> ALIGN_SHIFT
}

/// A key compared by address identity.
pub trait Identity: Copy {
    /// The address this key stands for.
    fn addr(&self) -> usize;
}

/// An opaque address used purely as an identity tag.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Addr(usize);

impl Addr {
    /// The null address.
    pub const NULL: Addr = Addr(0);

    #[inline]
    pub const fn new(addr: usize) -> Self {
        Addr(addr)
    }

    /// Address of the referent of `r`.
    #[inline]
    pub fn of<T: ?Sized>(r: &T) -> Self {
        Addr::from_ptr(r as *const T)
    }

    #[inline]
    pub fn from_ptr<T: ?Sized>(p: *const T) -> Self {
        Addr(p.cast::<u8>() as usize)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<usize> for Addr {
    fn from(addr: usize) -> Self {
        Addr(addr)
    }
}

impl From<Addr> for usize {
    fn from(addr: Addr) -> Self {
        addr.0
    }
}

impl<T: ?Sized> From<NonNull<T>> for Addr {
    fn from(p: NonNull<T>) -> Self {
        Addr::from_ptr(p.as_ptr())
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Addr({:#x})", self.0)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Identity for Addr {
    #[inline]
    fn addr(&self) -> usize {
        self.0
    }
}

impl<T: ?Sized> Identity for *const T {
    #[inline]
    fn addr(&self) -> usize {
        self.cast::<u8>() as usize
    }
}

impl<T: ?Sized> Identity for *mut T {
    #[inline]
    fn addr(&self) -> usize {
        self.cast::<u8>() as usize
    }
}

impl<T: ?Sized> Identity for NonNull<T> {
    #[inline]
    fn addr(&self) -> usize {
        self.as_ptr().cast::<u8>() as usize
    }
}

impl<'a, T: ?Sized> Identity for &'a T {
    #[inline]
    fn addr(&self) -> usize {
        (*self as *const T).cast::<u8>() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_drops_alignment_bits() {
        let step = 1usize << ALIGN_SHIFT;
        assert_eq!(identity_hash(0), 0);
        assert_eq!(identity_hash(step), 1);
        assert_eq!(identity_hash(step * 7), 7);
        // Bits below the alignment never reach the hash.
        assert_eq!(identity_hash(step * 7 + step - 1), 7);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn shift_matches_eight_byte_alignment() {
        assert_eq!(ALIGN_SHIFT, 3);
        assert_eq!(identity_hash(0x1000), 0x200);
    }

    /// Invariant: every pointer flavour of the same object reports one address.
    #[test]
    fn pointer_flavours_agree() {
        let mut x = 5u64;
        let r: &u64 = &x;
        let a = r.addr();
        let c: *const u64 = r;
        assert_eq!(Identity::addr(&c), a);
        assert_eq!(Addr::of(&x).get(), a);
        let m: *mut u64 = &mut x;
        assert_eq!(Identity::addr(&m), a);
        let nn = NonNull::from(&mut x);
        assert_eq!(Identity::addr(&nn), a);
        assert_eq!(Addr::from(nn).get(), a);
    }

    /// Invariant: identity ignores contents; equal values at distinct
    /// addresses are distinct keys.
    #[test]
    fn equal_values_have_distinct_identities() {
        let a = Box::new(1u32);
        let b = Box::new(1u32);
        assert_eq!(*a, *b);
        assert_ne!(Addr::of(&*a), Addr::of(&*b));
    }

    #[test]
    fn unsized_referents_use_data_address() {
        let v = [1u8, 2, 3];
        let s: &[u8] = &v;
        assert_eq!(s.addr(), v.as_ptr() as usize);
        let t: &str = "identity";
        assert_eq!(Addr::of(t).get(), t.as_ptr() as usize);
    }

    #[test]
    fn formatting() {
        let a = Addr::new(0x40);
        assert_eq!(format!("{a}"), "0x40");
        assert_eq!(format!("{a:?}"), "Addr(0x40)");
        assert!(Addr::NULL.is_null());
        assert!(!a.is_null());
    }
}
