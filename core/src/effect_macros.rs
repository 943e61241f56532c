//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when a reducer hands an async call to the
//! runtime, which is how every remote request in the check-in flow is made.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use turnstile_core::async_effect;
///
/// async_effect! {
///     let outcome = verify(&api, session.as_ref(), &event_id, &code).await;
///     Some(CheckInAction::VerificationCompleted { request, outcome })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Future` that replaces whatever runs under `id`
///
/// # Example
///
/// ```rust,ignore
/// use turnstile_core::latest_effect;
///
/// latest_effect! {
///     id: VERIFY_EFFECT,
///     async {
///         let outcome = verify(&api, session.as_ref(), &event_id, &code).await;
///         Some(CheckInAction::VerificationCompleted { request, outcome })
///     }
/// }
/// ```
#[macro_export]
macro_rules! latest_effect {
    (
        id: $id:expr,
        async { $($body:tt)* }
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($crate::async_effect! { $($body)* }),
        }
    };
}
