use std::hash::Hash;
use std::fmt::Debug;
use num::{NumCast, FromPrimitive, ToPrimitive, Zero, One};
use num_traits::Bounded;

#[macro_export]
macro_rules! trait_combiner {
	($combination_name: ident $([$($g: tt: $gc1: tt $(+ $gcn: tt)*),+])? $(: $t: tt $(+ $ts: tt)*)?) => {
		pub trait $combination_name$(<$($g: $gc1 $(+ $gcn)*,)+>)? $(: $t $(+ $ts)*)? {}
		impl<$($($g: $gc1 $(+ $gcn)*,)+)?T $(: $t $(+ $ts)*)?> $combination_name$(<$($g,)+>)? for T {}
	};
}
pub use trait_combiner;

trait_combiner!(Number: Bounded+NumCast+FromPrimitive+ToPrimitive+Zero+One+Copy+Clone+Debug);
trait_combiner!(Integer: Number+(num::Integer));
trait_combiner!(UnsignedInteger: Hash+Integer+(num::Unsigned));


#[test]
fn test_uint_combos() {
	fn roundtrip<R: UnsignedInteger>(n: usize) -> usize {
		R::from_usize(n).unwrap().to_usize().unwrap()
	}
	(0..200).for_each(|v| {
		assert_eq!(roundtrip::<u8>(v), v);
		assert_eq!(roundtrip::<u16>(v), v);
		assert_eq!(roundtrip::<u32>(v), v);
		assert_eq!(roundtrip::<u64>(v), v);
		assert_eq!(roundtrip::<usize>(v), v);
	});
	assert!(<u8 as Bounded>::max_value().to_usize().unwrap() == 255);
}
