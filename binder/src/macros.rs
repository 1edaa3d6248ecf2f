//! Public macros for declaring type relations and resolving bindings.

/// Declares that a concrete type can be bound to one or more trait objects.
///
/// Binding `dyn Trait` to a concrete type with
/// [`BindingBuilder::to`](crate::BindingBuilder::to) needs this edge.
///
/// # Examples
///
/// ```
/// use fibre_binder::{implements, Container, InjectionContext};
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
///
/// impl Greeter for English {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
///
/// implements!(English => dyn Greeter);
///
/// let container = Container::new();
/// container.factories().unwrap().register_default::<English>();
/// container.bind_singleton::<dyn Greeter>().to::<English>().unwrap();
///
/// let greeter = container
///   .resolve::<dyn Greeter>(None, &InjectionContext::new())
///   .unwrap();
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! implements {
  ($concrete:ty => $($iface:ty),+ $(,)?) => {
    $(
      impl $crate::Upcast<$iface> for $concrete {
        fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$iface> {
          self
        }
      }
    )+
  };
}

/// Resolves a type from a container with an empty injection context.
///
/// Expands to a call to [`Container::resolve`](crate::Container::resolve)
/// and evaluates to its `Result`.
///
/// # Examples
///
/// ```
/// use fibre_binder::{resolve, Container};
///
/// let container = Container::new();
/// container.bind::<String>().to_value("default".to_string());
/// container.bind::<String>().to_value("named".to_string()).as_id("x");
///
/// assert_eq!(*resolve!(container, String).unwrap(), "default");
/// assert_eq!(*resolve!(container, String, "x").unwrap(), "named");
/// ```
#[macro_export]
macro_rules! resolve {
  ($container:expr, $type:ty) => {
    $container.resolve::<$type>(None, &$crate::InjectionContext::new())
  };

  ($container:expr, $type:ty, $id:expr) => {
    $container.resolve::<$type>(
      Some(&$crate::Id::from($id)),
      &$crate::InjectionContext::new(),
    )
  };
}
