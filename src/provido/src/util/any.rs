use std::any::{self, Any};
use std::ops::Deref;
use std::sync::Arc;

pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    #[inline]
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

pub trait DowncastRef {
    fn is<T: Any>(&self) -> bool;

    fn downcast_ref<T: Any>(&self) -> Option<&T>;
}

impl<S> DowncastRef for S
where
    S: Deref<Target: AsAny>,
{
    #[inline]
    fn is<T: Any>(&self) -> bool {
        (**self).as_any().is::<T>()
    }

    #[inline]
    fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (**self).as_any().downcast_ref::<T>()
    }
}

/// Owning downcast for the pointers the container hands out. On failure the
/// original pointer is given back untouched.
pub trait Downcast: DowncastRef + Sized {
    type Output<T>;

    fn downcast<T: Any + Send + Sync>(self) -> Result<Self::Output<T>, Self>;
}

impl<S> Downcast for Box<S>
where
    S: AsAny + ?Sized,
{
    type Output<T> = Box<T>;

    fn downcast<T: Any + Send + Sync>(self) -> Result<Self::Output<T>, Self> {
        if self.is::<T>() {
            let res = self
                .into_any()
                .downcast::<T>()
                .unwrap_or_else(|_| std::unreachable!("`self` should be `Box<T>`"));
            Ok(res)
        } else {
            Err(self)
        }
    }
}

impl<S> Downcast for Arc<S>
where
    S: AsAny + ?Sized,
{
    type Output<T> = Arc<T>;

    fn downcast<T: Any + Send + Sync>(self) -> Result<Self::Output<T>, Self> {
        if self.is::<T>() {
            let res = self
                .into_any_arc()
                .downcast::<T>()
                .unwrap_or_else(|_| std::unreachable!("`self` should be `Arc<T>`"));
            Ok(res)
        } else {
            Err(self)
        }
    }
}
