/*!
 Contains the object-graph projector, which maps typed application values to
 and from the generic value tree using statically declared member lists.

 The projector is a thin boundary layer: the codec only ever sees [`Value`]
 trees, and types opt in by implementing [`PlistSerializable`]. Member lists
 are resolved once per type and cached for the projector's lifetime. The cache
 is not synchronized; a projector is meant to be used from a single thread.

 [`PlistSerializable`]: crate::projector::models::PlistSerializable
*/

pub mod models;

use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    io::{Read, Seek, Write},
    rc::Rc,
};

use crate::{
    codec::{reader::BinaryPlistReader, writer::BinaryPlistWriter},
    error::{reader::PlistReaderError, writer::PlistWriterError},
    projector::models::{Member, PlistSerializable},
    value::{Dictionary, Value},
};

/// Projects typed values to and from plist dictionaries
#[derive(Default)]
pub struct Projector {
    /// Member lists resolved so far, keyed by type
    cache: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl Projector {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Project a typed value into a dictionary through its member list
    ///
    /// Members whose projected value is the default for its kind are skipped
    /// unless their `emit_default` flag is set.
    pub fn to_dictionary<T: PlistSerializable + 'static>(&self, value: &T) -> Dictionary {
        let members = self.members_for::<T>();
        let mut entries = Dictionary::with_capacity(members.len());

        for member in members.iter() {
            let projected = (member.get)(self, value);
            if member.emit_default || !projected.is_default() {
                entries.insert(member.name.to_string(), projected);
            }
        }

        entries
    }

    /// Rebuild a typed value from a dictionary
    ///
    /// Members absent from the dictionary keep the value they get from
    /// [`Default`].
    pub fn from_dictionary<T: PlistSerializable + Default + 'static>(
        &self,
        dictionary: &Dictionary,
    ) -> T {
        let members = self.members_for::<T>();
        let mut value = T::default();

        for member in members.iter() {
            if let Some(projected) = dictionary.get(member.name) {
                (member.set)(self, &mut value, projected.clone());
            }
        }

        value
    }

    /// Project and encode in one step
    pub fn write_object<T: PlistSerializable + 'static, W: Write + Seek>(
        &self,
        stream: &mut W,
        value: &T,
    ) -> Result<(), PlistWriterError> {
        let dictionary = self.to_dictionary(value);
        BinaryPlistWriter::new().write_object(stream, &dictionary)
    }

    /// Decode and absorb in one step; the decoded root must be a dictionary
    pub fn read_object<T: PlistSerializable + Default + 'static, R: Read + Seek>(
        &self,
        stream: R,
    ) -> Result<T, PlistReaderError> {
        let value = BinaryPlistReader::new(stream).read_object()?;

        match value.as_dictionary() {
            Some(dictionary) => Ok(self.from_dictionary(dictionary)),
            None => Err(PlistReaderError::RootNotDictionary),
        }
    }

    fn members_for<T: PlistSerializable + 'static>(&self) -> Rc<Vec<Member<T>>> {
        let mut cache = self.cache.borrow_mut();
        let entry = cache
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Rc::new(T::members()) as Rc<dyn Any>);

        match Rc::clone(entry).downcast::<Vec<Member<T>>>() {
            Ok(members) => members,
            // The cache is keyed by TypeId, so a mismatched entry cannot
            // occur; resolve a fresh list rather than panic
            Err(_) => Rc::new(T::members()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::{
        projector::{
            models::{Member, PlistSerializable},
            Projector,
        },
        value::Value,
    };

    #[derive(Debug, Default, PartialEq)]
    struct Track {
        title: String,
        plays: i64,
        explicit: bool,
    }

    impl PlistSerializable for Track {
        fn members() -> Vec<Member<Self>> {
            vec![
                Member {
                    name: "title",
                    emit_default: true,
                    get: |_, track| Value::String(track.title.clone()),
                    set: |_, track, value| {
                        if let Value::String(title) = value {
                            track.title = title;
                        }
                    },
                },
                Member {
                    name: "plays",
                    emit_default: false,
                    get: |_, track| Value::Integer(track.plays),
                    set: |_, track, value| {
                        if let Value::Integer(plays) = value {
                            track.plays = plays;
                        }
                    },
                },
                Member {
                    name: "explicit",
                    emit_default: false,
                    get: |_, track| Value::Boolean(track.explicit),
                    set: |_, track, value| {
                        if let Value::Boolean(explicit) = value {
                            track.explicit = explicit;
                        }
                    },
                },
            ]
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Album {
        name: String,
        opener: Track,
    }

    impl PlistSerializable for Album {
        fn members() -> Vec<Member<Self>> {
            vec![
                Member {
                    name: "name",
                    emit_default: true,
                    get: |_, album| Value::String(album.name.clone()),
                    set: |_, album, value| {
                        if let Value::String(name) = value {
                            album.name = name;
                        }
                    },
                },
                Member {
                    name: "opener",
                    emit_default: true,
                    get: |projector, album| Value::Dictionary(projector.to_dictionary(&album.opener)),
                    set: |projector, album, value| {
                        if let Value::Dictionary(dictionary) = value {
                            album.opener = projector.from_dictionary(&dictionary);
                        }
                    },
                },
            ]
        }
    }

    #[test]
    fn test_project_members_in_declaration_order() {
        let track = Track {
            title: "Paranoid Android".to_string(),
            plays: 42,
            explicit: false,
        };

        let dictionary = Projector::new().to_dictionary(&track);

        let keys: Vec<&String> = dictionary.keys().collect();
        assert_eq!(keys, vec!["title", "plays"]);
        assert_eq!(dictionary["title"], Value::String("Paranoid Android".to_string()));
        assert_eq!(dictionary["plays"], Value::Integer(42));
    }

    #[test]
    fn test_skip_default_members() {
        let track = Track::default();

        let dictionary = Projector::new().to_dictionary(&track);

        // `title` always emits; `plays` and `explicit` are defaults and skipped
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary["title"], Value::String(String::new()));
    }

    #[test]
    fn test_absorb_keeps_defaults_for_absent_members() {
        let track = Track {
            title: "Airbag".to_string(),
            plays: 0,
            explicit: false,
        };
        let projector = Projector::new();

        let dictionary = projector.to_dictionary(&track);
        let absorbed: Track = projector.from_dictionary(&dictionary);

        assert_eq!(absorbed, track);
    }

    #[test]
    fn test_absorb_ignores_mismatched_kinds() {
        let mut dictionary = crate::value::Dictionary::new();
        dictionary.insert("title".to_string(), Value::Integer(13));
        dictionary.insert("plays".to_string(), Value::Integer(7));

        let absorbed: Track = Projector::new().from_dictionary(&dictionary);

        assert_eq!(absorbed.title, String::new());
        assert_eq!(absorbed.plays, 7);
    }

    #[test]
    fn test_nested_round_trip_through_codec() {
        let album = Album {
            name: "OK Computer".to_string(),
            opener: Track {
                title: "Airbag".to_string(),
                plays: 1997,
                explicit: false,
            },
        };
        let projector = Projector::new();

        let mut stream = Cursor::new(Vec::new());
        projector.write_object(&mut stream, &album).unwrap();
        stream.set_position(0);
        let decoded: Album = projector.read_object(stream).unwrap();

        assert_eq!(decoded, album);
    }

    #[test]
    fn test_member_cache_reuse() {
        let projector = Projector::new();
        let track = Track {
            title: "Let Down".to_string(),
            plays: 3,
            explicit: false,
        };

        // Both calls resolve through the same cached member list
        let first = projector.to_dictionary(&track);
        let second = projector.to_dictionary(&track);

        assert_eq!(first, second);
    }
}
