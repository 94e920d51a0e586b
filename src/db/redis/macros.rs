/// Returns the cached value for `$key`, or awaits `$block`, queues the result
/// for caching with a TTL of `$ttl` seconds and returns it.
///
/// `$cache` must expose `get_from_cache` and `set_in_background`. A failed
/// cache read is logged and treated as a miss; errors from the block
/// propagate with `?`.
///
/// ```rust,ignore
/// let venue: serde_json::Value = cached!(cache, CacheKey::Venue(id), 3600, async move {
///     fetch_venue(&id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, fetching directly");
                None
            }
        };
        if let Some(hit) = hit {
            Ok(hit)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
