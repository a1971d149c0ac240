// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::prim::{PrimElem, PrimVector};
use crate::vector::Vector;

impl<T: Serialize> Serialize for Vector<T> {
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

impl<'de, T: Deserialize<'de> + Clone> Deserialize<'de> for Vector<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeqVisitor<T>(std::marker::PhantomData<T>);

        impl<'de, T: Deserialize<'de> + Clone> Visitor<'de> for SeqVisitor<T> {
            type Value = Vector<T>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a sequence")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut transient = crate::TransientVector::new();
                while let Some(item) = seq.next_element()? {
                    transient.push_impl(item);
                }
                Ok(transient.finish())
            }
        }

        deserializer.deserialize_seq(SeqVisitor(std::marker::PhantomData))
    }
}

impl<P: PrimElem + Serialize> Serialize for PrimVector<P> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for elem in self.iter() {
            seq.serialize_element(&elem)?;
        }
        seq.end()
    }
}

impl<'de, P: PrimElem + Deserialize<'de>> Deserialize<'de> for PrimVector<P> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = Vector::<P>::deserialize(deserializer)?;
        Ok(inner.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::{FloatVector, Vector};

    #[test]
    fn vector_round_trip() {
        let v: Vector<u32> = (0..40).collect();
        let json = serde_json::to_string(&v).unwrap();
        let back: Vector<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn prim_vector_round_trip() {
        let v: FloatVector = [1.0, 2.5, -3.0].into_iter().collect();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "[1.0,2.5,-3.0]");
        let back: FloatVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
