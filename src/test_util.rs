// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Shared helpers for this crate's tests, and `quickcheck::Arbitrary`
//! impls behind the `arbitrary` feature.

#[cfg(test)]
pub(crate) use recording::TestDocument;


#[cfg(feature = "arbitrary")]
mod arbitrary_impls {
    use crate::{
        ops::Operation,
        values::{Blob, UpdateValue, ValueKind},
    };
    use quickcheck::{Arbitrary, Gen};

    impl Arbitrary for ValueKind {
        fn arbitrary(g: &mut Gen) -> Self {
            *g.choose(&[
                ValueKind::Counter,
                ValueKind::Flag,
                ValueKind::Register,
                ValueKind::Set,
                ValueKind::Map,
            ])
            .expect("the slice is non-empty")
        }
    }

    impl Arbitrary for Blob {
        fn arbitrary(g: &mut Gen) -> Self {
            Vec::<u8>::arbitrary(g).into()
        }

        fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
            Box::new(self.as_bytes().to_vec().shrink().map(Blob::from))
        }
    }

    impl Arbitrary for UpdateValue {
        fn arbitrary(g: &mut Gen) -> Self {
            match *g.choose(&[0, 1, 2]).expect("the slice is non-empty") {
                0 => Self::Int(i64::arbitrary(g)),
                1 => Self::Bool(bool::arbitrary(g)),
                _ => Self::Blob(Blob::arbitrary(g)),
            }
        }
    }

    impl Arbitrary for Operation {
        fn arbitrary(g: &mut Gen) -> Self {
            let op = match *g.choose(&[0, 1, 2, 3, 4, 5]).expect("the slice is non-empty") {
                0 => Operation::increment(i64::arbitrary(g)),
                1 => Operation::flag(bool::arbitrary(g)),
                2 => Operation::assign(Blob::arbitrary(g)),
                3 => Operation::add(Blob::arbitrary(g)),
                4 => Operation::remove(Blob::arbitrary(g)),
                _ => Operation::delete(ValueKind::arbitrary(g)),
            };
            op.named(String::arbitrary(g))
        }
    }
}
