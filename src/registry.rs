//! Process-wide operation table registry.
//!
//! Tables are keyed by `(callable type, signature, variant)`, built on first use
//! and leaked: they live until the process exits and are never reclaimed.
//! The number of distinct callable types a program stores is bounded, so this is a fixed cost.

use {
    crate::{
        signature::{Callable, Signature},
        variant::Admits,
        vtable::OpTable,
    },
    parking_lot::RwLock,
    rustc_hash::FxHashMap,
    std::{
        any::{self, Any, TypeId},
        sync::OnceLock,
    },
    tracing::debug,
};

type Table = &'static (dyn Any + Send + Sync);

static TABLES: OnceLock<RwLock<FxHashMap<TypeId, Table>>> = OnceLock::new();

fn tables() -> &'static RwLock<FxHashMap<TypeId, Table>> {
    TABLES.get_or_init(|| RwLock::new(FxHashMap::default()))
}

fn downcast<S: Signature>(table: Table) -> &'static OpTable<S> {
    match table.downcast_ref::<OpTable<S>>() {
        Some(table) => table,
        None => unreachable!("operation table registered under a foreign key"),
    }
}

/// Returns the operation table of the callable type `F` stored with signature `S` in variant `V`,
/// creating it if this is the first use.
pub(crate) fn table<F, S, V>() -> &'static OpTable<S>
where
    F: Callable<S> + 'static,
    S: Signature,
    V: Admits<F>,
{
    let key = TypeId::of::<(F, S, V)>();

    // Fast path: already registered.
    let cached = tables().read().get(&key).copied();
    if let Some(table) = cached {
        return downcast(table);
    }

    let mut registered = tables().write();

    // Another thread may have registered it in the meantime.
    let table = *registered.entry(key).or_insert_with(|| {
        let table = OpTable::<S>::of::<F, V>();

        debug!(
            callable = any::type_name::<F>(),
            signature = any::type_name::<S>(),
            placement = ?table.placement,
            copyable = V::COPYABLE,
            "registered operation table"
        );

        let table: Table = Box::leak(Box::new(table));
        table
    });

    downcast(table)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::variant::{Copyable, MoveOnly},
        std::{ptr, thread},
    };

    type Sig = fn(i32, i32) -> i32;

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    fn sub(a: i32, b: i32) -> i32 {
        a - b
    }

    fn table_of<F, V>(_: &F) -> &'static OpTable<Sig>
    where
        F: Callable<Sig> + 'static,
        V: Admits<F>,
    {
        table::<F, Sig, V>()
    }

    #[test]
    fn memoized() {
        let a = table_of::<_, Copyable>(&add);
        let b = table_of::<_, Copyable>(&add);
        assert!(ptr::eq(a, b));

        let c = table_of::<_, Copyable>(&sub);
        assert!(!ptr::eq(a, c));
        assert_ne!((a.identify)(), (c.identify)());
    }

    #[test]
    fn keyed_by_variant() {
        let copyable = table_of::<_, Copyable>(&add);
        let move_only = table_of::<_, MoveOnly>(&add);

        assert!(!ptr::eq(copyable, move_only));
        assert!(copyable.copy.is_some());
        assert!(move_only.copy.is_none());
        assert_eq!((copyable.identify)(), (move_only.identify)());
    }

    #[test]
    fn concurrent_first_use() {
        // A type no other test registers.
        type Mul = fn(i32, i32) -> i32;

        let addresses = (0..8)
            .map(|_| thread::spawn(|| table::<Mul, Sig, MoveOnly>() as *const OpTable<Sig> as usize))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>();

        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));

        let mul: Mul = |a, b| a * b;
        let table = table_of::<_, MoveOnly>(&mul);
        assert_eq!(table as *const OpTable<Sig> as usize, addresses[0]);
    }
}
