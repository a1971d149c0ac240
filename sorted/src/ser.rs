// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::sorted::{SortKey, SortedVector};

impl<T, E> Serialize for SortedVector<T, E>
where
    T: Serialize,
    E: SortKey<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for elem in self {
            seq.serialize_element(elem)?;
        }
        seq.end()
    }
}

impl<'de, T> Deserialize<'de> for SortedVector<T>
where
    T: Deserialize<'de> + Ord + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeqVisitor<T>(std::marker::PhantomData<T>);

        impl<'de, T: Deserialize<'de> + Ord + Clone> Visitor<'de> for SeqVisitor<T> {
            type Value = SortedVector<T>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a sequence")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(items.into_iter().collect())
            }
        }

        deserializer.deserialize_seq(SeqVisitor(std::marker::PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use crate::SortedVector;

    #[test]
    fn round_trip_restores_order() {
        let v: SortedVector<u32> = [5, 1, 4, 2, 3].into_iter().collect();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "[1,2,3,4,5]");
        let back: SortedVector<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
