//! Drive effect descriptions without a running store.
//!
//! Reducer tests usually stop at "the reducer asked for a request". When a
//! test also needs the response, `collect_actions` runs the returned effects
//! against whatever the environment injected (typically an in-memory mock)
//! and hands back the actions they produced, ready to be reduced next.

use std::future::Future;
use std::pin::Pin;
use turnstile_core::effect::Effect;

/// Run an effect to completion and collect the actions it produces
///
/// `Future` effects are awaited, `Cancellable` effects run their inner
/// effect, and `Cancel` produces nothing.
pub fn collect_actions<A>(effect: Effect<A>) -> Pin<Box<dyn Future<Output = Vec<A>> + Send>>
where
    A: Send + 'static,
{
    Box::pin(async move {
        match effect {
            Effect::None | Effect::Cancel(_) => Vec::new(),
            Effect::Future(fut) => fut.await.into_iter().collect(),
            Effect::Cancellable { effect, .. } => collect_actions(*effect).await,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_core::effect::EffectId;

    #[tokio::test]
    async fn test_collects_action_of_cancellable_future() {
        let effect = Effect::Future(Box::pin(async { Some(3) })).cancellable(EffectId::new("x"));

        assert_eq!(collect_actions(effect).await, vec![3]);
    }

    #[tokio::test]
    async fn test_empty_effects_collect_nothing() {
        assert!(collect_actions(Effect::<u8>::None).await.is_empty());
        assert!(collect_actions(Effect::<u8>::Cancel(EffectId::new("x"))).await.is_empty());
        assert!(collect_actions(Effect::<u8>::Future(Box::pin(async { None }))).await.is_empty());
    }
}
