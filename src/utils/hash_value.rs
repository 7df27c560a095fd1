use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::hash::hash64;

/// A pre-hashed, copyable stand-in for values of `T`, used where a name is
/// compared and looked up far more often than it is displayed.
#[derive(Debug, Eq)]
pub struct HashValue<T>(u64, PhantomData<T>)
where
    T: Hash + ?Sized;

impl<T> Clone for HashValue<T>
where
    T: Hash + ?Sized,
{
    fn clone(&self) -> Self {
        HashValue(self.0, self.1)
    }
}

impl<T> Copy for HashValue<T> where T: Hash + ?Sized {}

impl<T> PartialEq for HashValue<T>
where
    T: Hash + ?Sized,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Hash for HashValue<T>
where
    T: Hash + ?Sized,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.0.hash(state);
    }
}

impl<F> From<F> for HashValue<str>
where
    F: AsRef<str>,
{
    fn from(v: F) -> Self {
        HashValue(hash64(v.as_ref()), PhantomData)
    }
}

impl<T> PartialEq<T> for HashValue<str>
where
    T: AsRef<str>,
{
    fn eq(&self, other: &T) -> bool {
        self.0 == hash64(other.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let v1: HashValue<str> = "tick".into();
        let v2 = HashValue::from("tick".to_owned());
        let v3: HashValue<str> = "tock".into();

        assert_eq!(v1, v2);
        assert_ne!(v1, v3);
        assert_eq!(v1, "tick");
    }

    #[test]
    fn container() {
        use super::super::hash::FastHashSet;

        let mut set = FastHashSet::<HashValue<str>>::default();
        assert!(set.insert("a".into()));
        assert!(!set.insert("a".into()));
        assert!(set.insert("b".into()));
    }
}
