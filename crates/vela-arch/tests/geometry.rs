//! Property tests for the geometric oracle.

use proptest::prelude::*;
use vela_arch::{Architecture, Site};

fn arch() -> Architecture {
    Architecture::from_json_str(include_str!("fixtures/compute_store.json")).unwrap()
}

proptest! {
    /// The triangularized cache must answer identically for both argument
    /// orders.
    #[test]
    fn nearest_entanglement_site_is_order_independent(
        r1 in 0usize..20, c1 in 0usize..20,
        r2 in 0usize..20, c2 in 0usize..20,
    ) {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let a = Site::new(storage, r1, c1);
        let b = Site::new(storage, r2, c2);
        prop_assert_eq!(
            arch.nearest_entanglement_site(a, b),
            arch.nearest_entanglement_site(b, a)
        );
    }

    /// Every cached nearest site must be a valid entanglement site, and its
    /// interaction partner must be valid too.
    #[test]
    fn nearest_entanglement_site_is_valid(
        r1 in 0usize..20, c1 in 0usize..20,
        r2 in 0usize..20, c2 in 0usize..20,
    ) {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let e = arch.nearest_entanglement_site(Site::new(storage, r1, c1), Site::new(storage, r2, c2));
        prop_assert!(arch.is_valid_position(e));
        prop_assert!(arch.slm(e.slm).is_entanglement());
        prop_assert!(arch.is_valid_position(arch.other_entanglement_site(e)));
    }

    /// The nearest storage site for any entanglement site must be valid and
    /// in a storage SLM.
    #[test]
    fn nearest_storage_site_is_valid(r in 0usize..4, c in 0usize..4, half in 0usize..2) {
        let arch = arch();
        let ent = arch.entanglement_zones()[0][half];
        let s = arch.nearest_storage_site(Site::new(ent, r, c));
        prop_assert!(arch.is_valid_position(s));
        prop_assert!(arch.slm(s.slm).is_storage());
    }
}
